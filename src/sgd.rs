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

extern crate scoped_pool;

use std::slice::ChunksMut;

use scoped_pool::Pool;

use config::HyperParameters;
use error::Result;
use model::FactorModel;
use stats::RatingTable;
use types::{dot, Dimensions, Rating};

/// One gradient step for a single rating. The prediction error is computed once from the current
/// vectors, and both latent vectors are moved using the values of their counterpart from before
/// this step. Only the latent vectors and biases of `rating.user` and `rating.item` change.
pub fn update(model: &mut FactorModel, hyper: &HyperParameters, rating: &Rating) -> Result<()> {

    model.check(rating)?;

    let user = rating.user as usize;
    let item = rating.item as usize;

    apply(
        model.user_factors.column_mut(user),
        model.item_factors.column_mut(item),
        &mut model.user_bias[user],
        &mut model.item_bias[item],
        rating.score,
        hyper,
    );

    Ok(())
}

#[inline(always)]
fn apply(
    user_column: &mut [f64],
    item_column: &mut [f64],
    user_bias: &mut f64,
    item_bias: &mut f64,
    score: f64,
    hyper: &HyperParameters,
) {

    let alpha = hyper.alpha;
    let lambda = hyper.lambda;

    let error = dot(user_column, item_column) - score + *user_bias + *item_bias;

    for f in 0..user_column.len() {
        let user_value = user_column[f];
        let item_value = item_column[f];

        user_column[f] = user_value - alpha * (error * item_value + lambda * user_value);
        item_column[f] = item_value - alpha * (error * user_value + lambda * item_value);
    }

    *user_bias -= alpha * (error + lambda * *user_bias);
    *item_bias -= alpha * (error + lambda * *item_bias);
}

/// The single-threaded reference pass, one step per rating in table order.
pub fn sequential_pass(
    model: &mut FactorModel,
    table: &RatingTable,
    hyper: &HyperParameters,
) -> Result<()> {

    for rating in table.iter() {
        update(model, hyper, &rating)?;
    }

    Ok(())
}

/// The training ratings cut into a `num_blocks x num_blocks` grid of contiguous user id and item
/// id ranges. Ratings within a block keep their table order.
pub struct BlockGrid {
    num_blocks: usize,
    users_per_block: usize,
    items_per_block: usize,
    blocks: Vec<Vec<Rating>>,
}

impl BlockGrid {

    /// All ratings in the table have to lie within `dimensions`.
    pub fn new(table: &RatingTable, dimensions: &Dimensions, num_blocks: usize) -> Self {

        let users_per_block = block_size(dimensions.num_users, num_blocks);
        let items_per_block = block_size(dimensions.num_items, num_blocks);

        let mut blocks: Vec<Vec<Rating>> = vec![Vec::new(); num_blocks * num_blocks];

        for rating in table.iter() {
            let user_block = rating.user as usize / users_per_block;
            let item_block = rating.item as usize / items_per_block;
            blocks[user_block * num_blocks + item_block].push(rating);
        }

        BlockGrid { num_blocks, users_per_block, items_per_block, blocks }
    }

    pub fn num_blocks(&self) -> usize {
        self.num_blocks
    }

    pub fn block(&self, user_block: usize, item_block: usize) -> &[Rating] {
        &self.blocks[user_block * self.num_blocks + item_block]
    }
}

fn block_size(num_entities: usize, num_blocks: usize) -> usize {
    ((num_entities + num_blocks - 1) / num_blocks).max(1)
}

/// Latent vectors and biases of a contiguous range of entities.
type Block<'a> = (&'a mut [f64], &'a mut [f64]);

fn blocks<'a>(
    factors: ChunksMut<'a, f64>,
    biases: ChunksMut<'a, f64>,
    num_blocks: usize,
) -> Vec<Option<Block<'a>>> {

    let mut blocks: Vec<Option<Block<'a>>> = factors.zip(biases).map(Some).collect();
    // trailing blocks of small dimensions can be empty
    while blocks.len() < num_blocks {
        blocks.push(None);
    }
    blocks
}

/// Parallel pass in the style of distributed SGD. An epoch consists of `num_blocks` strata, in
/// stratum `s` the worker for user block `b` processes the ratings of item block
/// `(b + s) % num_blocks`. No two concurrently running workers ever touch the same user or item,
/// so the result does not depend on thread scheduling.
pub struct BlockedSgd {
    grid: BlockGrid,
    pool: Pool,
}

impl BlockedSgd {

    pub fn new(table: &RatingTable, dimensions: &Dimensions, num_threads: usize) -> Self {
        BlockedSgd {
            grid: BlockGrid::new(table, dimensions, num_threads),
            pool: Pool::new(num_threads),
        }
    }

    pub fn pass(&self, model: &mut FactorModel, hyper: &HyperParameters) {

        let grid = &self.grid;
        let num_blocks = grid.num_blocks();
        let num_factors = model.num_factors();

        for stratum in 0..num_blocks {

            let FactorModel {
                ref mut user_factors,
                ref mut item_factors,
                ref mut user_bias,
                ref mut item_bias,
                ..
            } = *model;

            let mut user_blocks = blocks(
                user_factors.column_blocks_mut(grid.users_per_block),
                user_bias.chunks_mut(grid.users_per_block),
                num_blocks,
            );

            let mut item_blocks = blocks(
                item_factors.column_blocks_mut(grid.items_per_block),
                item_bias.chunks_mut(grid.items_per_block),
                num_blocks,
            );

            self.pool.scoped(|scope| {
                for user_block in 0..num_blocks {

                    let item_block = (user_block + stratum) % num_blocks;
                    let ratings = grid.block(user_block, item_block);

                    if ratings.is_empty() {
                        continue;
                    }

                    let users = user_blocks[user_block].take();
                    let items = item_blocks[item_block].take();

                    if let (Some(users), Some(items)) = (users, items) {
                        let user_offset = user_block * grid.users_per_block;
                        let item_offset = item_block * grid.items_per_block;

                        scope.execute(move || {
                            update_block(
                                ratings,
                                users,
                                items,
                                user_offset,
                                item_offset,
                                num_factors,
                                hyper,
                            )
                        });
                    }
                }
            });
        }
    }
}

impl Drop for BlockedSgd {
    fn drop(&mut self) {
        self.pool.shutdown();
    }
}

fn update_block(
    ratings: &[Rating],
    (user_factors, user_bias): Block,
    (item_factors, item_bias): Block,
    user_offset: usize,
    item_offset: usize,
    num_factors: usize,
    hyper: &HyperParameters,
) {

    for rating in ratings.iter() {
        let user = rating.user as usize - user_offset;
        let item = rating.item as usize - item_offset;

        apply(
            &mut user_factors[user * num_factors..(user + 1) * num_factors],
            &mut item_factors[item * num_factors..(item + 1) * num_factors],
            &mut user_bias[user],
            &mut item_bias[item],
            rating.score,
            hyper,
        );
    }
}

#[cfg(test)]
mod tests {

    use config::HyperParameters;
    use model::{seeded_rng, FactorModel};
    use sgd::{sequential_pass, update, BlockGrid, BlockedSgd};
    use stats::{Baseline, RatingTable};
    use types::{Dimensions, FactorMatrix, Rating};

    fn two_by_two(user: [f64; 2], item: [f64; 2]) -> FactorModel {
        let mut user_factors = FactorMatrix::new(2, 2);
        let mut item_factors = FactorMatrix::new(2, 2);
        user_factors.column_mut(0).copy_from_slice(&user);
        item_factors.column_mut(0).copy_from_slice(&item);

        FactorModel {
            user_factors,
            item_factors,
            user_bias: vec![0.0, 0.0],
            item_bias: vec![0.0, 0.0],
            global_mean: 0.0,
        }
    }

    #[test]
    fn single_step_arithmetic() {
        let mut model = two_by_two([1.0, 0.0], [0.0, 1.0]);
        let untouched = model.clone();
        let hyper = HyperParameters { alpha: 0.1, lambda: 0.0 };

        update(&mut model, &hyper, &Rating::new(0, 0, 4.0)).unwrap();

        // error = 0 - 4, both vectors move using the old value of the other one
        assert_eq!(model.user_factors.column(0), &[1.0, 0.4]);
        assert_eq!(model.item_factors.column(0), &[0.4, 1.0]);
        assert_eq!(model.user_bias[0], 0.4);
        assert_eq!(model.item_bias[0], 0.4);

        // nothing else changes
        assert_eq!(model.user_factors.column(1), untouched.user_factors.column(1));
        assert_eq!(model.item_factors.column(1), untouched.item_factors.column(1));
        assert_eq!(model.user_bias[1], 0.0);
        assert_eq!(model.item_bias[1], 0.0);
    }

    #[test]
    fn regularized_step() {
        let mut model = two_by_two([1.0, 1.0], [1.0, 0.0]);
        model.user_bias[0] = 1.0;
        model.item_bias[0] = -0.5;
        let hyper = HyperParameters { alpha: 0.5, lambda: 0.5 };

        update(&mut model, &hyper, &Rating::new(0, 0, 1.5)).unwrap();

        // error = 1 - 1.5 + 1 - 0.5 = 0
        assert_eq!(model.user_factors.column(0), &[0.75, 0.75]);
        assert_eq!(model.item_factors.column(0), &[0.75, 0.0]);
        assert_eq!(model.user_bias[0], 0.75);
        assert_eq!(model.item_bias[0], -0.375);
    }

    #[test]
    fn out_of_range_ids() {
        let mut model = two_by_two([1.0, 0.0], [0.0, 1.0]);
        let before = model.clone();
        let hyper = HyperParameters { alpha: 0.1, lambda: 0.0 };

        assert!(update(&mut model, &hyper, &Rating::new(2, 0, 4.0)).is_err());
        assert!(update(&mut model, &hyper, &Rating::new(0, 5, 4.0)).is_err());
        assert_eq!(model, before);
    }

    fn training_data() -> (Vec<Rating>, Dimensions) {
        let mut ratings = Vec::new();
        for user in 0..9u32 {
            for item in 0..7u32 {
                if (user * 3 + item) % 4 != 0 {
                    ratings.push(Rating::new(user, item, ((user + item) % 5 + 1) as f64));
                }
            }
        }
        let dimensions = Dimensions::scan(&ratings, &[]);
        (ratings, dimensions)
    }

    fn initial_model(ratings: &[Rating], dimensions: &Dimensions) -> (RatingTable, FactorModel) {
        let (table, baseline) = Baseline::estimate(ratings, dimensions).unwrap();
        let model = FactorModel::initialize(3, dimensions, baseline, &mut seeded_rng(Some(11)));
        (table, model)
    }

    #[test]
    fn grid_partitions_all_ratings() {
        let (ratings, dimensions) = training_data();
        let (table, _) = initial_model(&ratings, &dimensions);

        let grid = BlockGrid::new(&table, &dimensions, 3);

        let mut num_ratings = 0;
        for user_block in 0..grid.num_blocks() {
            for item_block in 0..grid.num_blocks() {
                for rating in grid.block(user_block, item_block) {
                    assert_eq!(rating.user as usize / 3, user_block);
                    assert_eq!(rating.item as usize / 3, item_block);
                    num_ratings += 1;
                }
            }
        }

        assert_eq!(num_ratings, table.num_ratings());
    }

    #[test]
    fn blocked_pass_is_deterministic() {
        let (ratings, dimensions) = training_data();
        let hyper = HyperParameters { alpha: 0.01, lambda: 0.02 };

        let (table, mut model_a) = initial_model(&ratings, &dimensions);
        let (_, mut model_b) = initial_model(&ratings, &dimensions);
        let initial = model_a.clone();

        let blocked = BlockedSgd::new(&table, &dimensions, 3);
        for _ in 0..3 {
            blocked.pass(&mut model_a, &hyper);
            blocked.pass(&mut model_b, &hyper);
        }

        assert_eq!(model_a, model_b);
        assert!(model_a != initial);
    }

    #[test]
    fn single_block_equals_sequential_pass() {
        let (ratings, dimensions) = training_data();
        let hyper = HyperParameters { alpha: 0.01, lambda: 0.02 };

        let (table, mut sequential) = initial_model(&ratings, &dimensions);
        let (_, mut blocked) = initial_model(&ratings, &dimensions);

        sequential_pass(&mut sequential, &table, &hyper).unwrap();
        BlockedSgd::new(&table, &dimensions, 1).pass(&mut blocked, &hyper);

        assert_eq!(sequential, blocked);
    }
}
