//! Pre-built inputs and instrumented transformers.

use crate::block::{Block, RefBundle, RowBound};
use crate::context::{DEFAULT_TARGET_MAX_BLOCK_SIZE, RemoteArgs};
use crate::map_transformer::{BlockMapTransformer, MapTransformer};
use crate::task_context::TaskContext;
use anyhow::{Result, bail};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};

/// One bundle per entry of `counts`, each holding that many blocks of
/// `rows_per_block` rows. Rows are numbered `0..` across all bundles.
///
/// # Example
///
/// ```
/// use ironshuffle::testing::bundles_with_block_counts;
///
/// let bundles = bundles_with_block_counts(&[2, 3, 1], 4);
/// assert_eq!(bundles.iter().map(|b| b.num_blocks()).sum::<usize>(), 6);
/// assert_eq!(bundles.iter().map(|b| b.num_rows()).sum::<usize>(), 24);
/// ```
#[must_use]
pub fn bundles_with_block_counts(counts: &[usize], rows_per_block: usize) -> Vec<RefBundle<u64>> {
    let mut next = 0u64;
    counts
        .iter()
        .map(|&n| {
            let blocks = (0..n)
                .map(|_| {
                    let start = next;
                    next += rows_per_block as u64;
                    (start..next).collect::<Block<u64>>()
                })
                .collect();
            RefBundle::from_blocks(blocks)
        })
        .collect()
}

/// Build a [`RemoteArgs`] map from key/value pairs.
#[must_use]
pub fn remote_args(pairs: &[(&str, Value)]) -> RemoteArgs {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

/// Task context without an upstream operator and the default block size.
#[must_use]
pub fn test_task_context<T>() -> TaskContext<T> {
    TaskContext::new("random_shuffle", DEFAULT_TARGET_MAX_BLOCK_SIZE)
}

/// A [`BlockMapTransformer`] that counts how it is used.
pub struct RecordingTransformer<T> {
    inner: BlockMapTransformer<T>,
    set_calls: AtomicUsize,
    apply_calls: AtomicUsize,
}

impl<T: RowBound> RecordingTransformer<T> {
    #[must_use]
    pub fn new(inner: BlockMapTransformer<T>) -> Self {
        Self {
            inner,
            set_calls: AtomicUsize::new(0),
            apply_calls: AtomicUsize::new(0),
        }
    }

    /// Times `set_target_max_block_size` was called.
    #[must_use]
    pub fn set_calls(&self) -> usize {
        self.set_calls.load(Ordering::SeqCst)
    }

    /// Times `apply_transform` was called.
    #[must_use]
    pub fn apply_calls(&self) -> usize {
        self.apply_calls.load(Ordering::SeqCst)
    }
}

impl<T: RowBound> MapTransformer<T> for RecordingTransformer<T> {
    fn apply_transform(&self, blocks: Vec<Block<T>>, ctx: &TaskContext<T>) -> Result<Vec<Block<T>>> {
        self.apply_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.apply_transform(blocks, ctx)
    }

    fn set_target_max_block_size(&self, size: f64) {
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.set_target_max_block_size(size);
    }

    fn target_max_block_size(&self) -> f64 {
        self.inner.target_max_block_size()
    }
}

/// A transformer whose every application fails with `message`.
pub struct FailingTransformer {
    pub message: String,
}

impl<T: RowBound> MapTransformer<T> for FailingTransformer {
    fn apply_transform(&self, _blocks: Vec<Block<T>>, _ctx: &TaskContext<T>) -> Result<Vec<Block<T>>> {
        bail!("{}", self.message)
    }

    fn set_target_max_block_size(&self, _size: f64) {}

    fn target_max_block_size(&self) -> f64 {
        f64::INFINITY
    }
}
