//! Random shuffle as an all-to-all transform.
//!
//! [`generate_random_shuffle_fn`] builds a [`RandomShuffleFn`]: a transform from
//! input bundles plus a [`TaskContext`] to shuffled output bundles plus
//! [`ShuffleStats`](crate::stats::ShuffleStats). Each call:
//!
//! 1. counts the input blocks,
//! 2. fuses the context's upstream map transformer, if any, into the map stage,
//! 3. builds a fresh [`ShuffleTaskSpec`](crate::shuffle_spec::ShuffleTaskSpec),
//! 4. resolves the output count (the requested count, else one per input block),
//! 5. selects the scheduler for the configured strategy,
//! 6. runs the scheduler and returns its result unchanged.
//!
//! The seed is fixed when the transform is built. Every call through the same
//! transform, including retries, shuffles with that seed.
//!
//! # Example
//!
//! ```
//! use ironshuffle::block::RefBundle;
//! use ironshuffle::context::DataContext;
//! use ironshuffle::random_shuffle::{ShuffleRequest, RandomShuffleFn};
//! use ironshuffle::task_context::TaskContext;
//!
//! # fn main() -> anyhow::Result<()> {
//! let shuffle = RandomShuffleFn::<u32>::new(&DataContext::default(), ShuffleRequest::default().with_seed(7));
//! let input = vec![RefBundle::from_rows((0..100).collect(), 10)];
//! let (out, stats) = shuffle.apply(input, &TaskContext::new("random_shuffle", f64::INFINITY))?;
//!
//! assert_eq!(out.len(), 10);
//! assert_eq!(stats.seed, 7);
//! # Ok(())
//! # }
//! ```

use crate::block::{RefBundle, RowBound, total_blocks};
use crate::context::{DataContext, RemoteArgs};
use crate::fusion::fuse_upstream;
use crate::scheduler::{AllToAllTransformFnResult, select_scheduler};
use crate::seed::resolve_seed;
use crate::shuffle_spec::build_shuffle_spec;
use crate::task_context::TaskContext;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

/// An all-to-all transform in closure form, ready to drop into a pipeline stage.
pub type AllToAllTransformFn<T> =
    Arc<dyn Fn(Vec<RefBundle<T>>, &TaskContext<T>) -> Result<AllToAllTransformFnResult<T>> + Send + Sync>;

/// Caller-supplied options for a random shuffle.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShuffleRequest {
    /// Explicit seed. When absent, one is derived from the clock at build time.
    pub seed: Option<i32>,
    /// Number of output blocks. Only the pull-based strategy accepts this.
    pub num_outputs: Option<usize>,
    /// Resource requests for the shuffle's own tasks.
    pub remote_args: Option<RemoteArgs>,
    /// Map only the first N input blocks. For debugging.
    pub debug_block_limit: Option<usize>,
}

impl ShuffleRequest {
    #[must_use]
    pub fn with_seed(mut self, seed: i32) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn with_num_outputs(mut self, n: usize) -> Self {
        self.num_outputs = Some(n);
        self
    }

    #[must_use]
    pub fn with_remote_args(mut self, args: RemoteArgs) -> Self {
        self.remote_args = Some(args);
        self
    }

    #[must_use]
    pub fn with_debug_block_limit(mut self, n: usize) -> Self {
        self.debug_block_limit = Some(n);
        self
    }
}

/// A random shuffle bound to a configuration snapshot and a fixed seed.
pub struct RandomShuffleFn<T> {
    data_context: DataContext,
    seed: i32,
    num_outputs: Option<usize>,
    remote_args: Option<RemoteArgs>,
    debug_block_limit: Option<usize>,
    _t: PhantomData<fn() -> T>,
}

impl<T: RowBound> RandomShuffleFn<T> {
    /// Build the transform, fixing the seed now.
    #[must_use]
    pub fn new(data_context: &DataContext, request: ShuffleRequest) -> Self {
        let seed = resolve_seed(request.seed);
        debug!(seed, explicit = request.seed.is_some(), "resolved random shuffle seed");
        Self {
            data_context: data_context.clone(),
            seed,
            num_outputs: request.num_outputs,
            remote_args: request.remote_args,
            debug_block_limit: request.debug_block_limit,
            _t: PhantomData,
        }
    }

    /// Seed every invocation of this transform uses.
    #[must_use]
    pub const fn seed(&self) -> i32 {
        self.seed
    }

    /// Configuration snapshot taken at build time.
    #[must_use]
    pub const fn data_context(&self) -> &DataContext {
        &self.data_context
    }

    /// Shuffle `refs`.
    ///
    /// # Errors
    ///
    /// Returns [`ShuffleError::UnsupportedConfiguration`](crate::error::ShuffleError::UnsupportedConfiguration)
    /// before any task runs if the strategy is push-based and an output count was
    /// requested. Task failures propagate unchanged.
    pub fn apply(&self, refs: Vec<RefBundle<T>>, ctx: &TaskContext<T>) -> Result<AllToAllTransformFnResult<T>> {
        let num_input_blocks = total_blocks(&refs);

        let fused = fuse_upstream(ctx, self.remote_args.as_ref());
        let remote_args = fused.remote_args;
        let spec = build_shuffle_spec(ctx.target_max_block_size, self.seed, fused.map_fn);

        // A zero count means "not set", same as None.
        let output_num_blocks = self.num_outputs.filter(|n| *n > 0).unwrap_or(num_input_blocks);
        let scheduler = select_scheduler(&self.data_context, self.num_outputs, spec)?;

        debug!(
            op = %ctx.op_name,
            strategy = %scheduler.strategy(),
            num_input_blocks,
            output_num_blocks,
            fused = ctx.upstream_map_transformer.is_some(),
            "executing random shuffle"
        );
        scheduler.execute(
            refs,
            output_num_blocks,
            ctx,
            remote_args.as_ref(),
            remote_args.as_ref(),
            self.debug_block_limit,
        )
    }

    /// Wrap the transform as a shareable closure.
    #[must_use]
    pub fn into_fn(self) -> AllToAllTransformFn<T> {
        Arc::new(move |refs: Vec<RefBundle<T>>, ctx: &TaskContext<T>| self.apply(refs, ctx))
    }
}

/// Build a random shuffle transform from individual options.
///
/// The seed is resolved here, once; see [`RandomShuffleFn::new`].
#[must_use]
pub fn generate_random_shuffle_fn<T: RowBound>(
    data_context: &DataContext,
    seed: Option<i32>,
    num_outputs: Option<usize>,
    remote_args: Option<RemoteArgs>,
    debug_block_limit: Option<usize>,
) -> RandomShuffleFn<T> {
    RandomShuffleFn::new(
        data_context,
        ShuffleRequest {
            seed,
            num_outputs,
            remote_args,
            debug_block_limit,
        },
    )
}
