//! Shuffle task schedulers and strategy selection.
//!
//! Two schedulers execute a [`ShuffleTaskSpec`]:
//!
//! - [`PullBasedShuffleTaskScheduler`] runs every map task, then every reduce
//!   task pulls its slice from all map outputs. It honors any output count.
//! - [`PushBasedShuffleTaskScheduler`] runs map tasks in rounds and pushes each
//!   round's output through merge tasks before the final reduce. It decides its
//!   own output partitioning, so callers cannot request an output count.
//!
//! [`select_scheduler`] picks one from the configured [`ShuffleStrategy`]. The
//! choice is final: a configuration the strategy cannot honor is an error, never
//! a silent fallback to the other strategy.
//!
//! Both schedulers run their tasks in-process on rayon's thread pool.

pub mod pull_based;
pub mod push_based;

pub use pull_based::PullBasedShuffleTaskScheduler;
pub use push_based::PushBasedShuffleTaskScheduler;

use crate::block::{Block, BlockMetadata, BlockRef, RefBundle, RowBound};
use crate::context::{DataContext, RemoteArgs, ShuffleStrategy};
use crate::error::ShuffleError;
use crate::shuffle_spec::ShuffleTaskSpec;
use crate::stats::ShuffleStats;
use crate::task_context::TaskContext;
use anyhow::Result;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, info};

/// Output bundles and execution stats of an all-to-all transform.
pub type AllToAllTransformFnResult<T> = (Vec<RefBundle<T>>, ShuffleStats);

/// A scheduler bound to one [`ShuffleTaskSpec`].
#[derive(Debug)]
pub enum ShuffleScheduler<T> {
    PullBased(PullBasedShuffleTaskScheduler<T>),
    PushBased(PushBasedShuffleTaskScheduler<T>),
}

impl<T: RowBound> ShuffleScheduler<T> {
    #[must_use]
    pub const fn strategy(&self) -> ShuffleStrategy {
        match self {
            Self::PullBased(_) => ShuffleStrategy::PullBased,
            Self::PushBased(_) => ShuffleStrategy::PushBased,
        }
    }

    /// Shuffle `refs` into `output_num_blocks` blocks.
    ///
    /// `debug_block_limit` restricts the map stage to the first N input blocks.
    ///
    /// # Errors
    ///
    /// Propagates task failures unchanged.
    pub fn execute(
        &self,
        refs: Vec<RefBundle<T>>,
        output_num_blocks: usize,
        task_ctx: &TaskContext<T>,
        map_remote_args: Option<&RemoteArgs>,
        reduce_remote_args: Option<&RemoteArgs>,
        debug_block_limit: Option<usize>,
    ) -> Result<AllToAllTransformFnResult<T>> {
        match self {
            Self::PullBased(s) => s.execute(
                refs,
                output_num_blocks,
                task_ctx,
                map_remote_args,
                reduce_remote_args,
                debug_block_limit,
            ),
            Self::PushBased(s) => s.execute(
                refs,
                output_num_blocks,
                task_ctx,
                map_remote_args,
                reduce_remote_args,
                debug_block_limit,
            ),
        }
    }
}

/// Pick the scheduler for `data_context`'s strategy and bind it to `spec`.
///
/// # Errors
///
/// Returns [`ShuffleError::UnsupportedConfiguration`] when the strategy is
/// push-based and `num_outputs` is set.
pub fn select_scheduler<T: RowBound>(
    data_context: &DataContext,
    num_outputs: Option<usize>,
    spec: ShuffleTaskSpec<T>,
) -> Result<ShuffleScheduler<T>> {
    let scheduler = match data_context.shuffle_strategy {
        ShuffleStrategy::PushBased => {
            if let Some(n) = num_outputs {
                return Err(ShuffleError::UnsupportedConfiguration(format!(
                    "push-based shuffle doesn't support setting the number of output blocks yet (requested {n})"
                ))
                .into());
            }
            let mut s = PushBasedShuffleTaskScheduler::new(spec)
                .with_merge_factor(data_context.push_based_merge_factor);
            if let Some(per_round) = data_context.push_based_map_tasks_per_round {
                s = s.with_map_tasks_per_round(per_round);
            }
            ShuffleScheduler::PushBased(s)
        }
        ShuffleStrategy::PullBased => ShuffleScheduler::PullBased(PullBasedShuffleTaskScheduler::new(spec)),
    };
    debug!(strategy = %scheduler.strategy(), "selected shuffle scheduler");
    Ok(scheduler)
}

// ---------------- shared task plumbing ----------------

/// Flatten bundles into block handles, keeping only the first `limit` when set.
fn input_blocks<T: RowBound>(refs: &[RefBundle<T>], limit: Option<usize>, op_name: &str) -> Vec<BlockRef<T>> {
    let mut blocks: Vec<BlockRef<T>> = refs.iter().flat_map(|r| r.block_refs().cloned()).collect();
    if let Some(limit) = limit.filter(|l| *l < blocks.len()) {
        info!(
            op = op_name,
            limit,
            total = blocks.len(),
            "limiting shuffle execution to the first input blocks for debugging"
        );
        blocks.truncate(limit);
    }
    blocks
}

/// Run map tasks `base..base + blocks.len()` in parallel.
fn run_map_tasks<T: RowBound>(
    spec: &ShuffleTaskSpec<T>,
    blocks: &[BlockRef<T>],
    base: usize,
    output_num_blocks: usize,
) -> Result<Vec<Vec<Block<T>>>> {
    blocks
        .par_iter()
        .enumerate()
        .map(|(i, b)| {
            tracing::trace!(task = base + i, "map");
            spec.map(base + i, b, output_num_blocks)
        })
        .collect()
}

/// Metadata of each map task's total output.
fn map_output_metadata<T>(outputs: &[Vec<Block<T>>]) -> Vec<BlockMetadata> {
    outputs
        .iter()
        .map(|parts| BlockMetadata::for_rows::<T>(parts.iter().map(Vec::len).sum()))
        .collect()
}

/// Regroup per-map slices into per-reducer lists, preserving map order.
fn transpose<T>(map_outputs: Vec<Vec<Block<T>>>, output_num_blocks: usize) -> Vec<Vec<Block<T>>> {
    let mut per_reducer: Vec<Vec<Block<T>>> = (0..output_num_blocks)
        .map(|_| Vec::with_capacity(map_outputs.len()))
        .collect();
    for parts in map_outputs {
        for (j, part) in parts.into_iter().enumerate() {
            per_reducer[j].push(part);
        }
    }
    per_reducer
}

/// Run reduce tasks in parallel, one per output block.
fn run_reduce_tasks<T: RowBound>(
    spec: &ShuffleTaskSpec<T>,
    per_reducer: Vec<Vec<Block<T>>>,
) -> Vec<(Block<T>, BlockMetadata)> {
    per_reducer
        .into_par_iter()
        .enumerate()
        .map(|(j, parts)| {
            tracing::trace!(task = j, "reduce");
            spec.reduce(j, parts)
        })
        .collect()
}

/// One single-block bundle per reduce output.
fn into_bundles<T: RowBound>(outputs: Vec<(Block<T>, BlockMetadata)>) -> Vec<RefBundle<T>> {
    outputs
        .into_iter()
        .map(|(block, meta)| RefBundle::new(vec![(Arc::new(block), meta)]))
        .collect()
}

fn empty_stats(
    strategy: ShuffleStrategy,
    seed: i32,
    output_num_blocks: usize,
    num_input_blocks: usize,
    map_remote_args: Option<&RemoteArgs>,
    reduce_remote_args: Option<&RemoteArgs>,
) -> ShuffleStats {
    ShuffleStats {
        strategy,
        seed,
        output_num_blocks,
        num_input_blocks,
        map_remote_args: map_remote_args.cloned(),
        reduce_remote_args: reduce_remote_args.cloned(),
        stages: Vec::new(),
    }
}
