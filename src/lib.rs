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
extern crate fnv;
extern crate scoped_pool;
extern crate serde;
extern crate serde_json;
#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate log;

use std::time::{Duration, Instant};

use rand::Rng;

pub mod config;
pub mod error;
pub mod eval;
pub mod io;
pub mod model;
pub mod sgd;
pub mod stats;
pub mod types;

use config::{Config, ValidConfig};
use error::{Error, Result};
use model::FactorModel;
use sgd::BlockedSgd;
use stats::{Baseline, RatingTable};
use types::{Dimensions, Rating};

/// Metrics of a single training epoch. Field names will be used in JSON.
#[derive(Serialize, PartialEq, Clone, Debug)]
pub struct EpochReport {
    pub epoch: usize,
    pub cost: f64,
    pub rmse: f64,
    pub millis: u64,
}

enum Pass {
    Sequential,
    Blocked(BlockedSgd),
}

/// Owns a training run: the grouped training ratings, the held-out ratings and the factor model
/// which every epoch mutates in place.
pub struct Trainer {
    config: ValidConfig,
    table: RatingTable,
    test: Vec<Rating>,
    model: FactorModel,
    pass: Pass,
    num_epochs: usize,
}

impl Trainer {

    /// Reads both rating files and prepares training, see `Trainer::new`.
    pub fn from_files(config: &Config, train_path: &str, test_path: &str) -> Result<Self> {

        let config_checked = config.validate()?;

        info!("Reading training ratings from {}", train_path);
        let train = io::read_ratings_from_file(train_path, "train")?;

        info!("Reading evaluation ratings from {}", test_path);
        let test = io::read_ratings_from_file(test_path, "test")?;

        let mut rng = model::seeded_rng(config_checked.seed);
        Trainer::with_rng(config, train, test, &mut rng)
    }

    /// Validates the configuration, scans the dimensions of the data, estimates the baseline
    /// predictors and initializes the factor model from the configured seed.
    pub fn new(config: &Config, train: Vec<Rating>, test: Vec<Rating>) -> Result<Self> {
        let mut rng = model::seeded_rng(config.validate()?.seed);
        Trainer::with_rng(config, train, test, &mut rng)
    }

    /// Like `Trainer::new`, but draws the initial latent factors from `rng`.
    pub fn with_rng<R: Rng>(
        config: &Config,
        train: Vec<Rating>,
        test: Vec<Rating>,
        rng: &mut R,
    ) -> Result<Self> {

        let config = config.validate()?;

        if test.is_empty() {
            return Err(Error::EmptyInput(String::from("evaluation set")));
        }

        let dimensions = Dimensions::scan(&train, &test);
        info!(
            "Found {} training and {} evaluation ratings between {} users and {} items.",
            train.len(),
            test.len(),
            dimensions.num_users,
            dimensions.num_items,
        );

        let (table, baseline) = Baseline::estimate(&train, &dimensions)?;
        info!("The global mean rating is {}", baseline.global_mean);

        debug!("Initializing {} latent factors per user and item", config.num_factors);
        let model = FactorModel::initialize(config.num_factors, &dimensions, baseline, rng);

        let pass = if config.num_threads > 1 {
            debug!("Partitioning the ratings into {0}x{0} blocks", config.num_threads);
            Pass::Blocked(BlockedSgd::new(&table, &dimensions, config.num_threads))
        } else {
            Pass::Sequential
        };

        Ok(Trainer { config, table, test, model, pass, num_epochs: 0 })
    }

    /// One SGD pass over every training rating, followed by computing the training cost and the
    /// RMSE on the evaluation ratings.
    pub fn train_epoch(&mut self) -> Result<EpochReport> {

        let epoch_start = Instant::now();

        match self.pass {
            Pass::Sequential => {
                sgd::sequential_pass(&mut self.model, &self.table, &self.config.hyper)?
            },
            Pass::Blocked(ref blocked) => blocked.pass(&mut self.model, &self.config.hyper),
        }

        let cost = eval::cost(&self.model, &self.table)?;
        let rmse = eval::rmse(&self.model, &self.test, &self.config.range)?;

        self.num_epochs += 1;

        let report = EpochReport {
            epoch: self.num_epochs,
            cost,
            rmse,
            millis: to_millis(epoch_start.elapsed()),
        };

        info!(
            "Epoch {}: cost {}, RMSE {}, {}ms",
            report.epoch, report.cost, report.rmse, report.millis
        );

        Ok(report)
    }

    /// Runs the configured number of epochs, strictly one after the other.
    pub fn run(&mut self) -> Result<Vec<EpochReport>> {

        info!(
            "Running {} epochs with alpha {} and lambda {}",
            self.config.num_iterations, self.config.hyper.alpha, self.config.hyper.lambda
        );

        (0..self.config.num_iterations)
            .map(|_| self.train_epoch())
            .collect()
    }

    pub fn model(&self) -> &FactorModel {
        &self.model
    }

    pub fn into_model(self) -> FactorModel {
        self.model
    }

    pub fn num_epochs(&self) -> usize {
        self.num_epochs
    }
}

fn to_millis(duration: Duration) -> u64 {
    (duration.as_secs() * 1_000) + (duration.subsec_nanos() / 1_000_000) as u64
}
