//! Per-block map transformers that can be fused into a shuffle.
//!
//! A [`MapTransformer`] turns a group of input blocks into output blocks and
//! slices its output according to a target block size. The shuffle fuses an
//! upstream transformer into its map stage and raises that target to infinity,
//! since the map stage re-partitions whatever it receives anyway.
//!
//! [`BlockMapTransformer`] is the stock implementation: a chain of row-level
//! operations (map, filter, flat map) fused into a single pass per block.

use crate::block::{Block, RowBound};
use crate::task_context::TaskContext;
use crate::context::DEFAULT_TARGET_MAX_BLOCK_SIZE;
use anyhow::Result;
use std::marker::PhantomData;
use std::mem::size_of;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// A block-to-blocks transform with an adjustable output block size.
pub trait MapTransformer<T>: Send + Sync {
    /// Transform `blocks` into output blocks.
    ///
    /// # Errors
    ///
    /// Implementations may fail; the error is surfaced by the task that ran it.
    fn apply_transform(&self, blocks: Vec<Block<T>>, ctx: &TaskContext<T>) -> Result<Vec<Block<T>>>;

    /// Set the target size of output blocks, in bytes. `f64::INFINITY` disables slicing.
    ///
    /// Setting the same value again must be harmless.
    fn set_target_max_block_size(&self, size: f64);

    /// Current target size of output blocks, in bytes.
    fn target_max_block_size(&self) -> f64;
}

/// Lock-free `f64` cell for a target block size.
///
/// Transformers are shared through `Arc`, so the override has to go through
/// interior mutability.
#[derive(Debug)]
pub struct BlockSizeLimit(AtomicU64);

impl BlockSizeLimit {
    #[must_use]
    pub const fn new(size: f64) -> Self {
        Self(AtomicU64::new(size.to_bits()))
    }

    pub fn set(&self, size: f64) {
        self.0.store(size.to_bits(), Ordering::Release);
    }

    #[must_use]
    pub fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Acquire))
    }
}

/// A row-level operation applied to a whole block at once.
pub trait RowOp<T>: Send + Sync {
    fn apply(&self, rows: Vec<T>) -> Vec<T>;
}

struct MapOp<T, F>(F, PhantomData<fn() -> T>);
impl<T, F> RowOp<T> for MapOp<T, F>
where
    T: RowBound,
    F: Send + Sync + Fn(&T) -> T + 'static,
{
    fn apply(&self, rows: Vec<T>) -> Vec<T> {
        rows.iter().map(|r| self.0(r)).collect()
    }
}

struct FilterOp<T, P>(P, PhantomData<fn() -> T>);
impl<T, P> RowOp<T> for FilterOp<T, P>
where
    T: RowBound,
    P: Send + Sync + Fn(&T) -> bool + 'static,
{
    fn apply(&self, rows: Vec<T>) -> Vec<T> {
        rows.into_iter().filter(|r| self.0(r)).collect()
    }
}

struct FlatMapOp<T, F>(F, PhantomData<fn() -> T>);
impl<T, F> RowOp<T> for FlatMapOp<T, F>
where
    T: RowBound,
    F: Send + Sync + Fn(&T) -> Vec<T> + 'static,
{
    fn apply(&self, rows: Vec<T>) -> Vec<T> {
        let mut out = Vec::with_capacity(rows.len());
        for r in &rows {
            out.extend(self.0(r));
        }
        out
    }
}

/// Chain of row operations fused into one pass per block.
///
/// ```
/// use ironshuffle::map_transformer::{BlockMapTransformer, MapTransformer};
/// use ironshuffle::task_context::TaskContext;
///
/// let t = BlockMapTransformer::<u32>::new()
///     .map(|x| x + 1)
///     .filter(|x| x % 2 == 0);
/// let ctx = TaskContext::new("map", f64::INFINITY);
/// let out = t.apply_transform(vec![vec![1, 2, 3]], &ctx).unwrap();
/// assert_eq!(out, vec![vec![2, 4]]);
/// ```
pub struct BlockMapTransformer<T> {
    ops: Vec<Arc<dyn RowOp<T>>>,
    target_max_block_size: BlockSizeLimit,
}

impl<T: RowBound> Default for BlockMapTransformer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: RowBound> BlockMapTransformer<T> {
    /// Identity transformer with the default target block size.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ops: Vec::new(),
            target_max_block_size: BlockSizeLimit::new(DEFAULT_TARGET_MAX_BLOCK_SIZE),
        }
    }

    #[must_use]
    pub fn with_target_max_block_size(self, size: f64) -> Self {
        self.target_max_block_size.set(size);
        self
    }

    #[must_use]
    pub fn map<F>(mut self, f: F) -> Self
    where
        F: 'static + Send + Sync + Fn(&T) -> T,
    {
        self.ops.push(Arc::new(MapOp::<T, F>(f, PhantomData)));
        self
    }

    #[must_use]
    pub fn filter<P>(mut self, pred: P) -> Self
    where
        P: 'static + Send + Sync + Fn(&T) -> bool,
    {
        self.ops.push(Arc::new(FilterOp::<T, P>(pred, PhantomData)));
        self
    }

    #[must_use]
    pub fn flat_map<F>(mut self, f: F) -> Self
    where
        F: 'static + Send + Sync + Fn(&T) -> Vec<T>,
    {
        self.ops.push(Arc::new(FlatMapOp::<T, F>(f, PhantomData)));
        self
    }

    /// Number of fused row operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl<T: RowBound> MapTransformer<T> for BlockMapTransformer<T> {
    fn apply_transform(&self, blocks: Vec<Block<T>>, _ctx: &TaskContext<T>) -> Result<Vec<Block<T>>> {
        let mut rows = Vec::new();
        for block in blocks {
            let out = self.ops.iter().fold(block, |acc, op| op.apply(acc));
            rows.extend(out);
        }
        Ok(slice_rows(rows, self.target_max_block_size.get()))
    }

    fn set_target_max_block_size(&self, size: f64) {
        self.target_max_block_size.set(size);
    }

    fn target_max_block_size(&self) -> f64 {
        self.target_max_block_size.get()
    }
}

/// Rows of `T` that fit in `target` bytes, or `None` when there is no limit.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
#[must_use]
pub fn rows_per_block<T>(target: f64) -> Option<usize> {
    let row = size_of::<T>();
    if target.is_infinite() || row == 0 {
        return None;
    }
    Some(((target / row as f64).floor() as usize).max(1))
}

/// Cut `rows` into blocks no larger than `target` bytes.
///
/// No rows means no blocks; an unbounded target means a single block.
#[must_use]
pub fn slice_rows<T: RowBound>(rows: Vec<T>, target: f64) -> Vec<Block<T>> {
    if rows.is_empty() {
        return Vec::new();
    }
    match rows_per_block::<T>(target) {
        Some(n) if n < rows.len() => rows.chunks(n).map(<[T]>::to_vec).collect(),
        _ => vec![rows],
    }
}
