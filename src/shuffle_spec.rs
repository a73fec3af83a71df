//! The immutable plan for one shuffle and the per-task work it implies.
//!
//! A [`ShuffleTaskSpec`] is built fresh for every shuffle invocation and handed
//! to exactly one scheduler. It carries everything a map or reduce task needs:
//! the target block size, whether to randomize, the seed, and the optional fused
//! upstream map function.
//!
//! - **Map task `idx`**: run the upstream function over the input block (if any),
//!   shuffle the rows with an RNG keyed by `(seed, idx)`, then cut the rows into
//!   `output_num_blocks` contiguous slices.
//! - **Reduce task `j`**: concatenate slice `j` of every map output in map order,
//!   then shuffle with an RNG keyed by `(seed, j)`.
//!
//! Because every random choice is keyed by the seed and the task index, a task
//! that is retried produces exactly the rows it produced the first time.

use crate::block::{Block, BlockMetadata, RowBound};
use crate::fusion::UpstreamMapFn;
use crate::seed::{MAP_STREAM, REDUCE_STREAM, task_rng};
use anyhow::Result;
use rand::seq::SliceRandom;
use std::fmt::{Debug, Formatter, Result as FormatResult};

/// Static parameters of a single shuffle.
pub struct ShuffleTaskSpec<T> {
    target_block_size: f64,
    random_shuffle: bool,
    random_seed: i32,
    upstream_map_fn: Option<UpstreamMapFn<T>>,
}

impl<T: RowBound> ShuffleTaskSpec<T> {
    #[must_use]
    pub fn new(
        target_block_size: f64,
        random_shuffle: bool,
        random_seed: i32,
        upstream_map_fn: Option<UpstreamMapFn<T>>,
    ) -> Self {
        Self {
            target_block_size,
            random_shuffle,
            random_seed,
            upstream_map_fn,
        }
    }

    #[must_use]
    pub const fn target_block_size(&self) -> f64 {
        self.target_block_size
    }

    #[must_use]
    pub const fn random_shuffle(&self) -> bool {
        self.random_shuffle
    }

    #[must_use]
    pub const fn random_seed(&self) -> i32 {
        self.random_seed
    }

    #[must_use]
    pub const fn has_upstream_map_fn(&self) -> bool {
        self.upstream_map_fn.is_some()
    }

    /// Run map task `idx` over `block`, producing `output_num_blocks` slices.
    ///
    /// # Errors
    ///
    /// Propagates any error from the fused upstream map function.
    pub fn map(&self, idx: usize, block: &Block<T>, output_num_blocks: usize) -> Result<Vec<Block<T>>> {
        let mut rows: Block<T> = match &self.upstream_map_fn {
            Some(f) => f(vec![block.clone()])?.into_iter().flatten().collect(),
            None => block.clone(),
        };
        if self.random_shuffle {
            rows.shuffle(&mut task_rng(self.random_seed, MAP_STREAM, idx));
        }
        Ok(split_even(rows, output_num_blocks))
    }

    /// Run reduce task `partition` over the slices addressed to it.
    #[must_use]
    pub fn reduce(&self, partition: usize, mapper_outputs: Vec<Block<T>>) -> (Block<T>, BlockMetadata) {
        let mut rows: Block<T> = mapper_outputs.into_iter().flatten().collect();
        if self.random_shuffle {
            rows.shuffle(&mut task_rng(self.random_seed, REDUCE_STREAM, partition));
        }
        let meta = BlockMetadata::for_block(&rows);
        (rows, meta)
    }
}

/// Assemble the plan for one shuffle invocation.
///
/// Random shuffling is always on for plans built here.
#[must_use]
pub fn build_shuffle_spec<T: RowBound>(
    target_block_size: f64,
    seed: i32,
    upstream_map_fn: Option<UpstreamMapFn<T>>,
) -> ShuffleTaskSpec<T> {
    ShuffleTaskSpec::new(target_block_size, true, seed, upstream_map_fn)
}

/// Cut `rows` into exactly `n` contiguous slices of `max(1, ceil(len / n))` rows.
///
/// Trailing slices are empty when there are fewer rows than slices.
#[must_use]
pub fn split_even<T: Clone>(rows: Vec<T>, n: usize) -> Vec<Block<T>> {
    if n == 0 {
        return Vec::new();
    }
    let size = rows.len().div_ceil(n).max(1);
    let mut out: Vec<Block<T>> = rows.chunks(size).map(<[T]>::to_vec).collect();
    out.resize_with(n, Vec::new);
    out
}

impl<T> Debug for ShuffleTaskSpec<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        f.debug_struct("ShuffleTaskSpec")
            .field("target_block_size", &self.target_block_size)
            .field("random_shuffle", &self.random_shuffle)
            .field("random_seed", &self.random_seed)
            .field("upstream_map_fn", &self.upstream_map_fn.is_some())
            .finish()
    }
}
