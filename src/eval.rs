/**
 * SgdReco
 * Copyright (C) 2018 Sebastian Schelter
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <http://www.gnu.org/licenses/>.
 */

use config::Range;
use error::{Error, Result};
use model::FactorModel;
use stats::RatingTable;
use types::Rating;

/// Training cost, reported as the mean affinity (inner product of the latent vectors) over all
/// training ratings. Note that this is neither squared error nor does it look at the scores, it
/// only tracks how the reconstructed interaction signal evolves between epochs.
pub fn cost(model: &FactorModel, table: &RatingTable) -> Result<f64> {

    if table.is_empty() {
        return Err(Error::EmptyInput(String::from("training set")));
    }

    let mut total = 0.0;
    let mut count = 0;

    for rating in table.iter() {
        model.check(&rating)?;
        total += model.affinity(rating.user as usize, rating.item as usize);
        count += 1;
    }

    Ok(total / count as f64)
}

/// Root mean squared error of the clamped predictions on held-out ratings.
pub fn rmse(model: &FactorModel, test: &[Rating], range: &Range) -> Result<f64> {

    if test.is_empty() {
        return Err(Error::EmptyInput(String::from("evaluation set")));
    }

    let mut squared_error = 0.0;

    for rating in test.iter() {
        model.check(rating)?;
        let prediction = range.clamp(model.predict(rating.user as usize, rating.item as usize));
        let difference = prediction - rating.score;
        squared_error += difference * difference;
    }

    Ok((squared_error / test.len() as f64).sqrt())
}

#[cfg(test)]
mod tests {

    use std::f64::EPSILON;

    use config::Range;
    use error::Error;
    use eval::{cost, rmse};
    use model::FactorModel;
    use stats::RatingTable;
    use types::{FactorMatrix, Rating};

    // A model with a single latent factor, user u has factor u and item i has factor i.
    fn model() -> FactorModel {
        let mut user_factors = FactorMatrix::new(1, 3);
        let mut item_factors = FactorMatrix::new(1, 3);
        for entity in 0..3 {
            user_factors.set(0, entity, entity as f64);
            item_factors.set(0, entity, entity as f64);
        }

        FactorModel {
            user_factors,
            item_factors,
            user_bias: vec![0.0, 0.5, 0.7],
            item_bias: vec![0.0, 0.0, 0.0],
            global_mean: 3.0,
        }
    }

    const RANGE: Range = Range { min: 1.0, max: 5.0 };

    #[test]
    fn cost_is_mean_affinity() {
        let mut table = RatingTable::new();
        table.insert(Rating::new(1, 1, 5.0));
        table.insert(Rating::new(1, 2, 1.0));
        table.insert(Rating::new(2, 2, 2.0));

        // (1 + 2 + 4) / 3, scores and biases play no role
        let cost = cost(&model(), &table).unwrap();
        assert!((cost - 7.0 / 3.0).abs() < EPSILON);
    }

    #[test]
    fn predictions_are_clamped() {
        // raw prediction 2 * 3 + 0.7 = 6.7 is clamped to 5
        let model = FactorModel { item_factors: {
            let mut item_factors = FactorMatrix::new(1, 4);
            item_factors.set(0, 3, 3.0);
            item_factors
        }, item_bias: vec![0.0; 4], ..model() };

        let error = rmse(&model, &[Rating::new(2, 3, 5.0)], &RANGE).unwrap();
        assert_eq!(error, 0.0);

        let error = rmse(&model, &[Rating::new(2, 3, 4.0)], &RANGE).unwrap();
        assert_eq!(error, 1.0);

        // raw prediction 0 is clamped to 1
        let error = rmse(&model, &[Rating::new(0, 0, 3.0)], &RANGE).unwrap();
        assert_eq!(error, 2.0);
    }

    #[test]
    fn root_mean_squared_error() {
        // predictions 1.5 and 4.7
        let test = vec![Rating::new(1, 1, 2.5), Rating::new(2, 2, 4.7)];

        let error = rmse(&model(), &test, &RANGE).unwrap();
        assert!((error - (0.5f64).sqrt()).abs() < EPSILON);
    }

    #[test]
    fn zero_only_for_exact_predictions() {
        let exact = vec![Rating::new(1, 1, 1.5), Rating::new(2, 2, 4.7)];
        assert_eq!(rmse(&model(), &exact, &RANGE).unwrap(), 0.0);

        let almost = vec![Rating::new(1, 1, 1.5), Rating::new(2, 2, 4.6)];
        assert!(rmse(&model(), &almost, &RANGE).unwrap() > 0.0);
    }

    #[test]
    fn empty_or_unknown_ratings() {
        match rmse(&model(), &[], &RANGE) {
            Err(Error::EmptyInput(_)) => {},
            other => panic!("unexpected result {:?}", other),
        }

        match rmse(&model(), &[Rating::new(3, 0, 1.0)], &RANGE) {
            Err(Error::IndexOutOfRange { .. }) => {},
            other => panic!("unexpected result {:?}", other),
        }

        assert!(cost(&model(), &RatingTable::new()).is_err());
    }
}
