//! Fusing an upstream per-block map into the shuffle's map stage.
//!
//! When a map operator sits directly in front of a shuffle, the planner hands
//! the shuffle the upstream transformer through the [`TaskContext`] instead of
//! materializing the map's output. [`fuse_upstream`] turns that transformer into
//! a plain block function for the shuffle map tasks and swaps in the upstream
//! operator's resource requests, since the fused stage now runs the upstream
//! work.

use crate::block::{Block, RowBound};
use crate::context::RemoteArgs;
use crate::task_context::TaskContext;
use anyhow::Result;
use std::fmt::{Debug, Formatter, Result as FormatResult};
use std::sync::Arc;
use tracing::debug;

/// Block function applied to each map task's input before shuffling.
pub type UpstreamMapFn<T> = Arc<dyn Fn(Vec<Block<T>>) -> Result<Vec<Block<T>>> + Send + Sync>;

/// Outcome of fusion for one shuffle invocation.
pub struct FusedUpstream<T> {
    /// Function to run on each map input, if an upstream map was fused.
    pub map_fn: Option<UpstreamMapFn<T>>,
    /// Resource requests for both the map and reduce phases.
    pub remote_args: Option<RemoteArgs>,
}

impl<T> FusedUpstream<T> {
    #[must_use]
    pub const fn is_fused(&self) -> bool {
        self.map_fn.is_some()
    }
}

impl<T> Debug for FusedUpstream<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        f.debug_struct("FusedUpstream")
            .field("fused", &self.is_fused())
            .field("remote_args", &self.remote_args)
            .finish()
    }
}

/// Wire the context's upstream transformer (if any) into the shuffle.
///
/// Without an upstream transformer the caller's `remote_args` are returned
/// unchanged. With one, its target block size is raised to infinity so it emits
/// whole blocks for the shuffle to re-partition, and the upstream operator's
/// remote args replace the caller's.
pub fn fuse_upstream<T: RowBound>(ctx: &TaskContext<T>, remote_args: Option<&RemoteArgs>) -> FusedUpstream<T> {
    let Some(transformer) = ctx.upstream_map_transformer.clone() else {
        return FusedUpstream {
            map_fn: None,
            remote_args: remote_args.cloned(),
        };
    };

    transformer.set_target_max_block_size(f64::INFINITY);
    debug!(op = %ctx.op_name, "fused upstream map transformer into shuffle map stage");

    let task_ctx = ctx.clone();
    let map_fn: UpstreamMapFn<T> = Arc::new(move |blocks: Vec<Block<T>>| transformer.apply_transform(blocks, &task_ctx));

    FusedUpstream {
        map_fn: Some(map_fn),
        remote_args: ctx.upstream_map_remote_args.clone(),
    }
}
