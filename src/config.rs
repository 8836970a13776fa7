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

use error::{Error, Result};

pub const DEFAULT_ALPHA: f64 = 0.003;
pub const DEFAULT_LAMBDA: f64 = 0.01;
pub const DEFAULT_RANGE_MIN: f64 = 1.0;
pub const DEFAULT_RANGE_MAX: f64 = 5.0;

/// Learning rate and regularization of the gradient steps.
#[derive(PartialEq, Clone, Copy, Debug)]
pub struct HyperParameters {
    pub alpha: f64,
    pub lambda: f64,
}

/// The interval valid ratings live in, predictions are clamped into it.
#[derive(PartialEq, Clone, Copy, Debug)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    #[inline(always)]
    pub fn clamp(&self, value: f64) -> f64 {
        if value < self.min {
            self.min
        } else if value > self.max {
            self.max
        } else {
            value
        }
    }
}

/// Configuration as handed over by the caller. The number of factors and iterations have no
/// sensible defaults and must be set explicitly.
#[derive(PartialEq, Clone, Debug)]
pub struct Config {
    pub num_factors: Option<usize>,
    pub num_iterations: Option<usize>,
    pub alpha: f64,
    pub lambda: f64,
    pub range_min: f64,
    pub range_max: f64,
    /// 1 runs the sequential reference pass, larger values the blocked parallel pass.
    pub num_threads: usize,
    /// Seed for the latent factor initialization, drawn from the OS if absent.
    pub seed: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            num_factors: None,
            num_iterations: None,
            alpha: DEFAULT_ALPHA,
            lambda: DEFAULT_LAMBDA,
            range_min: DEFAULT_RANGE_MIN,
            range_max: DEFAULT_RANGE_MAX,
            num_threads: 1,
            seed: None,
        }
    }
}

/// A configuration which passed `Config::validate`.
#[derive(PartialEq, Clone, Copy, Debug)]
pub struct ValidConfig {
    pub num_factors: usize,
    pub num_iterations: usize,
    pub hyper: HyperParameters,
    pub range: Range,
    pub num_threads: usize,
    pub seed: Option<u32>,
}

impl Config {

    pub fn validate(&self) -> Result<ValidConfig> {

        let num_factors = match self.num_factors {
            Some(n) if n > 0 => n,
            Some(_) => return invalid("number of factors must be greater than zero"),
            None => return invalid("number of factors is not set"),
        };

        let num_iterations = match self.num_iterations {
            Some(n) if n > 0 => n,
            Some(_) => return invalid("number of iterations must be greater than zero"),
            None => return invalid("number of iterations is not set"),
        };

        if !(self.alpha.is_finite() && self.alpha > 0.0) {
            return invalid("learning rate alpha must be a positive number");
        }

        if !(self.lambda.is_finite() && self.lambda >= 0.0) {
            return invalid("regularization lambda must be a non-negative number");
        }

        if !(self.range_min.is_finite() && self.range_max.is_finite()
            && self.range_min < self.range_max) {
            return invalid("rating range minimum must be smaller than its maximum");
        }

        if self.num_threads == 0 {
            return invalid("number of threads must be greater than zero");
        }

        Ok(ValidConfig {
            num_factors,
            num_iterations,
            hyper: HyperParameters { alpha: self.alpha, lambda: self.lambda },
            range: Range { min: self.range_min, max: self.range_max },
            num_threads: self.num_threads,
            seed: self.seed,
        })
    }
}

fn invalid<T>(message: &str) -> Result<T> {
    Err(Error::Configuration(message.to_owned()))
}
