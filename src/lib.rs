//! # Ironshuffle
//!
//! A **random shuffle planner** for block-partitioned datasets. Ironshuffle turns
//! a shuffle request into a single deterministic, retry-safe execution plan and
//! hands it to one of two interchangeable schedulers.
//!
//! ## Key Features
//!
//! - **Retry-safe randomness** - the seed is fixed when the transform is built, so
//!   a re-executed task reproduces its original output
//! - **Upstream fusion** - a per-block map operator in front of the shuffle runs
//!   inside the shuffle's map tasks instead of materializing its output first
//! - **Pluggable strategies** - pull-based or push-based execution, chosen from
//!   process-wide configuration, with strategy constraints enforced up front
//! - **Execution stats** - per-stage task, block, row, and timing statistics
//!
//! ## Quick Start
//!
//! ```
//! use ironshuffle::*;
//! # use anyhow::Result;
//!
//! # fn main() -> Result<()> {
//! let data_context = DataContext::default();
//! let shuffle = generate_random_shuffle_fn::<u64>(&data_context, Some(42), None, None, None);
//!
//! let input = vec![
//!     RefBundle::from_rows((0..50).collect(), 10),
//!     RefBundle::from_rows((50..80).collect(), 10),
//! ];
//! let ctx = TaskContext::new("random_shuffle", data_context.target_max_block_size);
//! let (output, stats) = shuffle.apply(input, &ctx)?;
//!
//! // One output block per input block when no count is requested.
//! assert_eq!(output.len(), 8);
//! assert_eq!(stats.total_rows("reduce"), 80);
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Blocks and bundles
//!
//! A [`Block`] is a vector of rows. Blocks travel as shared handles inside
//! [`RefBundle`]s together with their [`BlockMetadata`].
//!
//! ### The shuffle transform
//!
//! [`generate_random_shuffle_fn`] returns a [`RandomShuffleFn`]. Calling
//! [`apply`](RandomShuffleFn::apply) with input bundles and a [`TaskContext`]
//! yields the shuffled bundles and [`ShuffleStats`]. Each call:
//!
//! 1. fuses the context's upstream [`MapTransformer`] (if any) via [`fuse_upstream`]
//! 2. builds a [`ShuffleTaskSpec`] with the fixed seed
//! 3. resolves the output count (requested, else one per input block)
//! 4. picks a scheduler with [`select_scheduler`] and runs it
//!
//! ### Strategies
//!
//! [`ShuffleStrategy::PullBased`] accepts any output count.
//! [`ShuffleStrategy::PushBased`] rejects an explicit output count with
//! [`ShuffleError::UnsupportedConfiguration`].
//!
//! ## Module Overview
//!
//! - [`block`] - blocks, metadata, and bundles
//! - [`context`] - process-wide configuration and strategies
//! - [`task_context`] - per-invocation context
//! - [`map_transformer`] - fusable per-block transforms
//! - [`seed`] - seed resolution and task RNGs
//! - [`fusion`] - upstream fusion
//! - [`shuffle_spec`] - the shuffle plan and its map/reduce tasks
//! - [`scheduler`] - strategy selection and the two schedulers
//! - [`random_shuffle`] - the shuffle transform
//! - [`stats`] - execution statistics
//! - [`testing`] - fixtures and assertions for tests

pub mod block;
pub mod context;
pub mod error;
pub mod fusion;
pub mod map_transformer;
pub mod random_shuffle;
pub mod scheduler;
pub mod seed;
pub mod shuffle_spec;
pub mod stats;
pub mod task_context;
pub mod testing;

// General re-exports
pub use block::{Block, BlockMetadata, BlockRef, RefBundle, RowBound};
pub use context::{DataContext, RemoteArgs, ShuffleStrategy};
pub use error::ShuffleError;
pub use fusion::{FusedUpstream, UpstreamMapFn, fuse_upstream};
pub use map_transformer::{BlockMapTransformer, MapTransformer};
pub use random_shuffle::{AllToAllTransformFn, RandomShuffleFn, ShuffleRequest, generate_random_shuffle_fn};
pub use scheduler::{
    AllToAllTransformFnResult, PullBasedShuffleTaskScheduler, PushBasedShuffleTaskScheduler, ShuffleScheduler,
    select_scheduler,
};
pub use seed::{INT32_MAX, resolve_seed};
pub use shuffle_spec::{ShuffleTaskSpec, build_shuffle_spec};
pub use stats::{ShuffleStats, StageStats};
pub use task_context::TaskContext;
