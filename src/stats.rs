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

extern crate fnv;

use fnv::FnvHashMap;

use error::{check_index, Entity, Error, Result};
use types;
use types::{DenseVector, Dimensions, Rating};

impl Dimensions {

    /// First pass over the data: the number of users and items is one larger than the largest
    /// id found in either the training or the evaluation ratings.
    pub fn scan(train: &[Rating], test: &[Rating]) -> Self {

        let mut max_user_id: u32 = 0;
        let mut max_item_id: u32 = 0;

        for rating in train.iter().chain(test.iter()) {
            max_user_id = max_user_id.max(rating.user);
            max_item_id = max_item_id.max(rating.item);
        }

        Dimensions { num_users: max_user_id as usize + 1, num_items: max_item_id as usize + 1 }
    }
}

/// The training ratings grouped by user. Users as well as the items of each user are kept in the
/// order in which they were first seen, so that training passes over the table are reproducible.
/// A repeated (user, item) pair overwrites the earlier score but keeps its position.
pub struct RatingTable {
    users: Vec<(u32, Vec<(u32, f64)>)>,
    user_positions: FnvHashMap<u32, usize>,
    entry_positions: FnvHashMap<(u32, u32), usize>,
    num_ratings: usize,
}

impl RatingTable {

    pub fn new() -> Self {
        RatingTable {
            users: Vec::new(),
            user_positions: FnvHashMap::with_capacity_and_hasher(100, Default::default()),
            entry_positions: FnvHashMap::with_capacity_and_hasher(100, Default::default()),
            num_ratings: 0,
        }
    }

    pub fn insert(&mut self, rating: Rating) {

        let users = &mut self.users;
        let user_position = *self.user_positions.entry(rating.user)
            .or_insert_with(|| {
                users.push((rating.user, Vec::with_capacity(10)));
                users.len() - 1
            });

        let items = &mut users[user_position].1;

        match self.entry_positions.get(&(rating.user, rating.item)) {
            Some(&item_position) => items[item_position].1 = rating.score,
            None => {
                self.entry_positions.insert((rating.user, rating.item), items.len());
                items.push((rating.item, rating.score));
                self.num_ratings += 1;
            },
        }
    }

    pub fn num_users(&self) -> usize {
        self.users.len()
    }

    /// Number of distinct (user, item) pairs.
    pub fn num_ratings(&self) -> usize {
        self.num_ratings
    }

    pub fn is_empty(&self) -> bool {
        self.num_ratings == 0
    }

    pub fn iter<'a>(&'a self) -> impl Iterator<Item=Rating> + 'a {
        self.users.iter()
            .flat_map(|&(user, ref items)| {
                items.iter().map(move |&(item, score)| Rating::new(user, item, score))
            })
    }
}

impl Default for RatingTable {
    fn default() -> Self {
        RatingTable::new()
    }
}

/// Baseline predictors: the global mean of the training scores and the mean deviation of every
/// user and every item from it.
#[derive(PartialEq, Clone, Debug)]
pub struct Baseline {
    pub global_mean: f64,
    pub user_bias: DenseVector,
    pub item_bias: DenseVector,
}

impl Baseline {

    /// Second pass over the training data, which also groups the ratings into a `RatingTable`.
    /// Every rating contributes to the means, even a repeated (user, item) pair which only keeps
    /// its last score in the table.
    pub fn estimate(train: &[Rating], dimensions: &Dimensions) -> Result<(RatingTable, Baseline)> {

        if train.is_empty() {
            return Err(Error::EmptyInput(String::from("training set")));
        }

        let mut user_sums = types::new_dense_vector(dimensions.num_users);
        let mut user_counts: Vec<u32> = vec![0; dimensions.num_users];
        let mut item_sums = types::new_dense_vector(dimensions.num_items);
        let mut item_counts: Vec<u32> = vec![0; dimensions.num_items];

        let mut total = 0.0;
        let mut table = RatingTable::new();

        for rating in train.iter() {
            let user_idx = rating.user as usize;
            let item_idx = rating.item as usize;

            check_index(Entity::User, user_idx, dimensions.num_users)?;
            check_index(Entity::Item, item_idx, dimensions.num_items)?;

            user_sums[user_idx] += rating.score;
            user_counts[user_idx] += 1;
            item_sums[item_idx] += rating.score;
            item_counts[item_idx] += 1;
            total += rating.score;

            table.insert(*rating);
        }

        let global_mean = total / train.len() as f64;
        debug!("the global mean rating is {}", global_mean);

        let user_bias = deviations(user_sums, &user_counts, global_mean);
        let item_bias = deviations(item_sums, &item_counts, global_mean);

        Ok((table, Baseline { global_mean, user_bias, item_bias }))
    }
}

fn deviations(mut sums: DenseVector, counts: &[u32], global_mean: f64) -> DenseVector {
    for (sum, count) in sums.iter_mut().zip(counts.iter()) {
        if *count != 0 {
            *sum = *sum / *count as f64 - global_mean;
        }
    }
    sums
}
