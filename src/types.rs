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

use std::slice::ChunksMut;

/// A single observed rating, the timestamp of the input is dropped while parsing.
#[derive(PartialEq, Clone, Copy, Debug)]
pub struct Rating {
    pub user: u32,
    pub item: u32,
    pub score: f64,
}

impl Rating {
    pub fn new(user: u32, item: u32, score: f64) -> Self {
        Rating { user, item, score }
    }
}

/// Number of users and items, fixed for the lifetime of a training run.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Dimensions {
    pub num_users: usize,
    pub num_items: usize,
}

pub type DenseVector = Vec<f64>;

pub fn new_dense_vector(dimensions: usize) -> DenseVector {
    vec![0.0; dimensions]
}

/// A `num_factors x num_entities` matrix. Element (f, e) is the f-th latent coordinate of
/// entity e. We store the matrix column by column, so that the latent vector of an entity is a
/// contiguous slice and disjoint ranges of entities can be handed out to different threads.
#[derive(PartialEq, Clone, Debug)]
pub struct FactorMatrix {
    num_factors: usize,
    num_entities: usize,
    values: Vec<f64>,
}

impl FactorMatrix {

    pub fn new(num_factors: usize, num_entities: usize) -> Self {
        FactorMatrix { num_factors, num_entities, values: vec![0.0; num_factors * num_entities] }
    }

    pub fn num_factors(&self) -> usize {
        self.num_factors
    }

    pub fn num_entities(&self) -> usize {
        self.num_entities
    }

    #[inline(always)]
    pub fn get(&self, factor: usize, entity: usize) -> f64 {
        self.values[entity * self.num_factors + factor]
    }

    #[inline(always)]
    pub fn set(&mut self, factor: usize, entity: usize, value: f64) {
        self.values[entity * self.num_factors + factor] = value;
    }

    #[inline(always)]
    pub fn column(&self, entity: usize) -> &[f64] {
        let start = entity * self.num_factors;
        &self.values[start..start + self.num_factors]
    }

    #[inline(always)]
    pub fn column_mut(&mut self, entity: usize) -> &mut [f64] {
        let start = entity * self.num_factors;
        &mut self.values[start..start + self.num_factors]
    }

    /// Splits the matrix into disjoint blocks of `entities_per_block` consecutive columns, the
    /// last block may be smaller.
    pub fn column_blocks_mut(&mut self, entities_per_block: usize) -> ChunksMut<f64> {
        self.values.chunks_mut(entities_per_block * self.num_factors)
    }
}

/// Plain inner product over the factor dimension.
#[inline(always)]
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    let mut sum = 0.0;
    for f in 0..a.len() {
        sum += a[f] * b[f];
    }
    sum
}
