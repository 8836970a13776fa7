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

extern crate rand;

use rand::{Rng, SeedableRng, XorShiftRng};

use error::{check_index, Entity, Result};
use stats::Baseline;
use types::{dot, DenseVector, Dimensions, FactorMatrix, Rating};

/// The complete training state: latent factors and biases of all users and items. The biases are
/// deviations from `global_mean`, which itself never changes during training.
#[derive(PartialEq, Clone, Debug)]
pub struct FactorModel {
    pub user_factors: FactorMatrix,
    pub item_factors: FactorMatrix,
    pub user_bias: DenseVector,
    pub item_bias: DenseVector,
    pub global_mean: f64,
}

impl FactorModel {

    /// Draws every latent coordinate independently from `[0, 1/sqrt(num_factors))`, all user
    /// coordinates first (factor by factor), then all item coordinates. The biases start from the
    /// baseline predictors.
    pub fn initialize<R: Rng>(
        num_factors: usize,
        dimensions: &Dimensions,
        baseline: Baseline,
        rng: &mut R,
    ) -> Self {

        debug_assert!(num_factors > 0);
        debug_assert_eq!(baseline.user_bias.len(), dimensions.num_users);
        debug_assert_eq!(baseline.item_bias.len(), dimensions.num_items);

        let scale = 1.0 / (num_factors as f64).sqrt();

        let user_factors = random_factors(num_factors, dimensions.num_users, scale, rng);
        let item_factors = random_factors(num_factors, dimensions.num_items, scale, rng);

        FactorModel {
            user_factors,
            item_factors,
            user_bias: baseline.user_bias,
            item_bias: baseline.item_bias,
            global_mean: baseline.global_mean,
        }
    }

    pub fn num_factors(&self) -> usize {
        self.user_factors.num_factors()
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            num_users: self.user_factors.num_entities(),
            num_items: self.item_factors.num_entities(),
        }
    }

    /// Fails if the rating refers to a user or item the model does not know.
    pub fn check(&self, rating: &Rating) -> Result<()> {
        check_index(Entity::User, rating.user as usize, self.user_factors.num_entities())?;
        check_index(Entity::Item, rating.item as usize, self.item_factors.num_entities())
    }

    /// Inner product of the latent vectors of a user and an item.
    #[inline(always)]
    pub fn affinity(&self, user: usize, item: usize) -> f64 {
        dot(self.user_factors.column(user), self.item_factors.column(item))
    }

    /// Unclamped rating prediction: the affinity plus both biases.
    #[inline(always)]
    pub fn predict(&self, user: usize, item: usize) -> f64 {
        self.affinity(user, item) + self.user_bias[user] + self.item_bias[item]
    }
}

fn random_factors<R: Rng>(
    num_factors: usize,
    num_entities: usize,
    scale: f64,
    rng: &mut R,
) -> FactorMatrix {

    let mut factors = FactorMatrix::new(num_factors, num_entities);

    for factor in 0..num_factors {
        for entity in 0..num_entities {
            factors.set(factor, entity, rng.gen::<f64>() * scale);
        }
    }

    factors
}

/// The random source for the initialization. A given seed always produces the same generator,
/// without a seed we draw one from the operating system.
pub fn seeded_rng(seed: Option<u32>) -> XorShiftRng {
    match seed {
        // the constants keep the xorshift state from ever being all zeros
        Some(seed) => XorShiftRng::from_seed([seed, seed ^ 0x9E37_79B9, 0x243F_6A88, 0x85A3_08D3]),
        None => rand::weak_rng(),
    }
}

#[cfg(test)]
mod tests {

    use model::{seeded_rng, FactorModel};
    use stats::Baseline;
    use types::{Dimensions, Rating};

    fn baseline() -> Baseline {
        Baseline { global_mean: 3.0, user_bias: vec![1.0, -2.0, 0.0], item_bias: vec![0.5, 0.0] }
    }

    #[test]
    fn initial_factors_are_scaled() {
        let dimensions = Dimensions { num_users: 3, num_items: 2 };
        let model = FactorModel::initialize(4, &dimensions, baseline(), &mut seeded_rng(Some(42)));

        let bound = 1.0 / 2.0;
        for factor in 0..4 {
            for user in 0..3 {
                let value = model.user_factors.get(factor, user);
                assert!(value >= 0.0 && value < bound);
            }
            for item in 0..2 {
                let value = model.item_factors.get(factor, item);
                assert!(value >= 0.0 && value < bound);
            }
        }

        assert_eq!(model.user_bias, vec![1.0, -2.0, 0.0]);
        assert_eq!(model.item_bias, vec![0.5, 0.0]);
        assert_eq!(model.global_mean, 3.0);
        assert_eq!(model.dimensions(), dimensions);
        assert_eq!(model.num_factors(), 4);
    }

    #[test]
    fn same_seed_same_model() {
        let dimensions = Dimensions { num_users: 3, num_items: 2 };

        let model_a = FactorModel::initialize(5, &dimensions, baseline(), &mut seeded_rng(Some(7)));
        let model_b = FactorModel::initialize(5, &dimensions, baseline(), &mut seeded_rng(Some(7)));
        let model_c = FactorModel::initialize(5, &dimensions, baseline(), &mut seeded_rng(Some(8)));

        assert_eq!(model_a, model_b);
        assert!(model_a != model_c);
    }

    #[test]
    fn predictions_include_biases() {
        let dimensions = Dimensions { num_users: 3, num_items: 2 };
        let mut model = FactorModel::initialize(2, &dimensions, baseline(), &mut seeded_rng(None));

        model.user_factors.column_mut(0).copy_from_slice(&[1.0, 2.0]);
        model.item_factors.column_mut(0).copy_from_slice(&[0.5, 0.25]);

        assert_eq!(model.affinity(0, 0), 1.0);
        assert_eq!(model.predict(0, 0), 2.5);
    }

    #[test]
    fn unknown_ids() {
        let dimensions = Dimensions { num_users: 3, num_items: 2 };
        let model = FactorModel::initialize(2, &dimensions, baseline(), &mut seeded_rng(Some(1)));

        assert!(model.check(&Rating::new(2, 1, 1.0)).is_ok());
        assert!(model.check(&Rating::new(3, 1, 1.0)).is_err());
        assert!(model.check(&Rating::new(0, 2, 1.0)).is_err());
    }
}
