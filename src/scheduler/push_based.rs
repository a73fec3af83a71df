//! Push-based shuffle: map rounds feeding merge tasks, then a final reduce.
//!
//! Map tasks run in rounds of `map_tasks_per_round`. As soon as a round finishes,
//! its slices are pushed to merge tasks; each merge task owns a contiguous range
//! of output partitions and concatenates that round's slices for each partition
//! into one merged block. Reduce task `j` finally combines partition `j`'s merged
//! block from every round.
//!
//! Slices are concatenated in map order within a round and rounds are combined in
//! order, so the reduce input matches the pull-based reduce input row for row.

use super::{
    AllToAllTransformFnResult, empty_stats, input_blocks, into_bundles, map_output_metadata, run_map_tasks,
    run_reduce_tasks, transpose,
};
use crate::block::{Block, BlockMetadata, RefBundle, RowBound};
use crate::context::{RemoteArgs, ShuffleStrategy};
use crate::shuffle_spec::ShuffleTaskSpec;
use crate::stats::{MAP_STAGE, MERGE_STAGE, REDUCE_STAGE, StageStats};
use crate::task_context::TaskContext;
use anyhow::Result;
use rayon::prelude::*;
use std::fmt::{Debug, Formatter, Result as FormatResult};
use std::ops::Range;
use std::time::Instant;
use tracing::debug;

pub struct PushBasedShuffleTaskScheduler<T> {
    spec: ShuffleTaskSpec<T>,
    merge_factor: usize,
    map_tasks_per_round: usize,
}

impl<T: RowBound> PushBasedShuffleTaskScheduler<T> {
    /// Scheduler with a merge factor of 2 and one map task per CPU per round.
    #[must_use]
    pub fn new(spec: ShuffleTaskSpec<T>) -> Self {
        Self {
            spec,
            merge_factor: 2,
            map_tasks_per_round: num_cpus::get().max(1),
        }
    }

    /// Map outputs handled by each merge task. Clamped to at least 1.
    #[must_use]
    pub fn with_merge_factor(mut self, merge_factor: usize) -> Self {
        self.merge_factor = merge_factor.max(1);
        self
    }

    /// Map tasks per round. Clamped to at least 1.
    #[must_use]
    pub fn with_map_tasks_per_round(mut self, n: usize) -> Self {
        self.map_tasks_per_round = n.max(1);
        self
    }

    #[must_use]
    pub const fn spec(&self) -> &ShuffleTaskSpec<T> {
        &self.spec
    }

    #[must_use]
    pub const fn merge_factor(&self) -> usize {
        self.merge_factor
    }

    #[must_use]
    pub const fn map_tasks_per_round(&self) -> usize {
        self.map_tasks_per_round
    }

    /// Merge tasks per round for `output_num_blocks` partitions.
    #[must_use]
    pub fn merge_tasks_per_round(&self, output_num_blocks: usize) -> usize {
        (self.map_tasks_per_round / self.merge_factor)
            .max(1)
            .min(output_num_blocks.max(1))
    }

    /// Shuffle `refs` into `output_num_blocks` blocks.
    ///
    /// # Errors
    ///
    /// Propagates the first map task failure; later rounds are not started.
    pub fn execute(
        &self,
        refs: Vec<RefBundle<T>>,
        output_num_blocks: usize,
        task_ctx: &TaskContext<T>,
        map_remote_args: Option<&RemoteArgs>,
        reduce_remote_args: Option<&RemoteArgs>,
        debug_block_limit: Option<usize>,
    ) -> Result<AllToAllTransformFnResult<T>> {
        let blocks = input_blocks(&refs, debug_block_limit, &task_ctx.op_name);
        let mut stats = empty_stats(
            ShuffleStrategy::PushBased,
            self.spec.random_seed(),
            output_num_blocks,
            blocks.len(),
            map_remote_args,
            reduce_remote_args,
        );
        if output_num_blocks == 0 {
            return Ok((Vec::new(), stats));
        }

        let ranges = partition_ranges(output_num_blocks, self.merge_tasks_per_round(output_num_blocks));
        debug!(
            op = %task_ctx.op_name,
            maps = blocks.len(),
            rounds = blocks.len().div_ceil(self.map_tasks_per_round),
            merges_per_round = ranges.len(),
            reduces = output_num_blocks,
            "running push-based shuffle"
        );

        let mut map_stats = StageStats::new(MAP_STAGE);
        let mut merge_stats = StageStats::new(MERGE_STAGE);
        let mut merged: Vec<Vec<Block<T>>> = (0..output_num_blocks).map(|_| Vec::new()).collect();

        for (round, chunk) in blocks.chunks(self.map_tasks_per_round).enumerate() {
            let started = Instant::now();
            let base = round * self.map_tasks_per_round;
            let map_outputs = run_map_tasks(&self.spec, chunk, base, output_num_blocks)?;
            map_stats.record(chunk.len(), map_output_metadata(&map_outputs), started.elapsed());

            let started = Instant::now();
            let round_merged = merge_round(transpose(map_outputs, output_num_blocks), &ranges);
            merge_stats.record(
                ranges.len(),
                round_merged.iter().map(BlockMetadata::for_block).collect(),
                started.elapsed(),
            );
            for (j, block) in round_merged.into_iter().enumerate() {
                merged[j].push(block);
            }
        }
        drop(blocks);

        let mut reduce_stats = StageStats::new(REDUCE_STAGE);
        let started = Instant::now();
        let outputs = run_reduce_tasks(&self.spec, merged);
        reduce_stats.record(
            outputs.len(),
            outputs.iter().map(|(_, m)| *m).collect(),
            started.elapsed(),
        );

        stats.stages = vec![map_stats, merge_stats, reduce_stats];
        Ok((into_bundles(outputs), stats))
    }
}

/// Split `0..n` into `k` contiguous, nearly equal ranges.
fn partition_ranges(n: usize, k: usize) -> Vec<Range<usize>> {
    let k = k.clamp(1, n.max(1));
    let (base, extra) = (n / k, n % k);
    let mut start = 0;
    (0..k)
        .map(|i| {
            let len = base + usize::from(i < extra);
            let r = start..start + len;
            start += len;
            r
        })
        .collect()
}

/// Run one round's merge tasks. Returns one merged block per output partition.
fn merge_round<T: RowBound>(per_reducer: Vec<Vec<Block<T>>>, ranges: &[Range<usize>]) -> Vec<Block<T>> {
    let mut slices = per_reducer.into_iter();
    let groups: Vec<Vec<Vec<Block<T>>>> = ranges
        .iter()
        .map(|r| slices.by_ref().take(r.len()).collect())
        .collect();

    groups
        .into_par_iter()
        .map(|group| {
            group
                .into_iter()
                .map(|parts| parts.into_iter().flatten().collect::<Block<T>>())
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect()
}

impl<T> Debug for PushBasedShuffleTaskScheduler<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        f.debug_struct("PushBasedShuffleTaskScheduler")
            .field("spec", &self.spec)
            .field("merge_factor", &self.merge_factor)
            .field("map_tasks_per_round", &self.map_tasks_per_round)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_ranges_cover_all_outputs() {
        let ranges = partition_ranges(7, 3);
        assert_eq!(ranges, vec![0..3, 3..5, 5..7]);
    }

    #[test]
    fn partition_ranges_never_exceed_outputs() {
        let ranges = partition_ranges(2, 8);
        assert_eq!(ranges, vec![0..1, 1..2]);
    }

    #[test]
    fn merge_round_concatenates_in_map_order() {
        let per_reducer = vec![
            vec![vec![1, 2], vec![3]],
            vec![vec![4], vec![]],
            vec![vec![], vec![5, 6]],
        ];
        let merged = merge_round(per_reducer, &partition_ranges(3, 2));
        assert_eq!(merged, vec![vec![1, 2, 3], vec![4], vec![5, 6]]);
    }
}
