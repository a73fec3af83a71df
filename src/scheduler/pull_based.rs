//! Pull-based shuffle: all maps, then all reduces.

use super::{
    AllToAllTransformFnResult, empty_stats, input_blocks, into_bundles, map_output_metadata, run_map_tasks,
    run_reduce_tasks, transpose,
};
use crate::block::{RefBundle, RowBound};
use crate::context::{RemoteArgs, ShuffleStrategy};
use crate::shuffle_spec::ShuffleTaskSpec;
use crate::stats::{MAP_STAGE, REDUCE_STAGE, StageStats};
use crate::task_context::TaskContext;
use anyhow::Result;
use std::fmt::{Debug, Formatter, Result as FormatResult};
use std::time::Instant;
use tracing::debug;

/// Runs one map task per input block, then one reduce task per output block
/// that pulls its slice from every map output.
pub struct PullBasedShuffleTaskScheduler<T> {
    spec: ShuffleTaskSpec<T>,
}

impl<T: RowBound> PullBasedShuffleTaskScheduler<T> {
    #[must_use]
    pub const fn new(spec: ShuffleTaskSpec<T>) -> Self {
        Self { spec }
    }

    #[must_use]
    pub const fn spec(&self) -> &ShuffleTaskSpec<T> {
        &self.spec
    }

    /// Shuffle `refs` into `output_num_blocks` blocks.
    ///
    /// # Errors
    ///
    /// Propagates the first map task failure.
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
            ShuffleStrategy::PullBased,
            self.spec.random_seed(),
            output_num_blocks,
            blocks.len(),
            map_remote_args,
            reduce_remote_args,
        );
        if output_num_blocks == 0 {
            return Ok((Vec::new(), stats));
        }
        debug!(
            op = %task_ctx.op_name,
            maps = blocks.len(),
            reduces = output_num_blocks,
            "running pull-based shuffle"
        );

        let mut map_stats = StageStats::new(MAP_STAGE);
        let started = Instant::now();
        let map_outputs = run_map_tasks(&self.spec, &blocks, 0, output_num_blocks)?;
        map_stats.record(blocks.len(), map_output_metadata(&map_outputs), started.elapsed());
        drop(blocks);

        let mut reduce_stats = StageStats::new(REDUCE_STAGE);
        let started = Instant::now();
        let outputs = run_reduce_tasks(&self.spec, transpose(map_outputs, output_num_blocks));
        reduce_stats.record(
            outputs.len(),
            outputs.iter().map(|(_, m)| *m).collect(),
            started.elapsed(),
        );

        stats.stages = vec![map_stats, reduce_stats];
        Ok((into_bundles(outputs), stats))
    }
}

impl<T> Debug for PullBasedShuffleTaskScheduler<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        f.debug_struct("PullBasedShuffleTaskScheduler")
            .field("spec", &self.spec)
            .finish()
    }
}
