//! Testing utilities for shuffle transforms.
//!
//! This module provides:
//!
//! - **Fixtures**: input bundles with chosen block counts, remote-args maps
//! - **Instrumented transformers**: [`RecordingTransformer`] counts block-size
//!   overrides and applications; [`FailingTransformer`] always errors
//! - **Assertions**: compare shuffled output against its input
//!
//! # Quick Start
//!
//! ```
//! use ironshuffle::context::DataContext;
//! use ironshuffle::random_shuffle::{RandomShuffleFn, ShuffleRequest};
//! use ironshuffle::testing::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let input = bundles_with_block_counts(&[2, 3, 1], 4);
//! let shuffle = RandomShuffleFn::new(&DataContext::default(), ShuffleRequest::default().with_seed(1));
//! let (out, _) = shuffle.apply(input.clone(), &test_task_context())?;
//!
//! assert_eq!(out.len(), 6);
//! assert_is_permutation(&collect_rows(&out), &collect_rows(&input));
//! # Ok(())
//! # }
//! ```

pub mod assertions;
pub mod fixtures;

pub use assertions::*;
pub use fixtures::*;
