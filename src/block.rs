//! Blocks and bundles of blocks.
//!
//! A dataset is split into [`Block`]s: plain vectors of rows. Blocks move between
//! operators as shared [`BlockRef`]s grouped into [`RefBundle`]s, each block paired
//! with its [`BlockMetadata`]. The shuffle never mutates an input block; it reads
//! through the shared handle and produces fresh output blocks.

use serde::{Deserialize, Serialize};
use std::mem::size_of;
use std::sync::Arc;

/// Bound required of every row type carried through a shuffle.
pub trait RowBound: 'static + Send + Sync + Clone {}
impl<T> RowBound for T where T: 'static + Send + Sync + Clone {}

/// A block of rows.
pub type Block<T> = Vec<T>;

/// Shared, read-only handle to a block.
pub type BlockRef<T> = Arc<Block<T>>;

/// Row and size accounting for one block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMetadata {
    /// Number of rows in the block.
    pub num_rows: usize,
    /// Estimated in-memory size of the rows, in bytes.
    pub size_bytes: usize,
}

impl BlockMetadata {
    /// Compute metadata for a block of `T`.
    #[must_use]
    pub fn for_block<T>(block: &Block<T>) -> Self {
        Self::for_rows::<T>(block.len())
    }

    /// Metadata for `num_rows` rows of `T`.
    #[must_use]
    pub const fn for_rows<T>(num_rows: usize) -> Self {
        Self {
            num_rows,
            size_bytes: num_rows * size_of::<T>(),
        }
    }
}

/// An ordered group of block handles with their metadata.
///
/// Bundles are the unit that flows between operators. The shuffle only reads a
/// bundle's blocks; ownership of the input stays with the caller.
#[derive(Clone, Debug)]
pub struct RefBundle<T> {
    blocks: Vec<(BlockRef<T>, BlockMetadata)>,
}

impl<T: RowBound> RefBundle<T> {
    /// Create a bundle from already-shared blocks.
    #[must_use]
    pub fn new(blocks: Vec<(BlockRef<T>, BlockMetadata)>) -> Self {
        Self { blocks }
    }

    /// Wrap owned blocks, computing their metadata.
    #[must_use]
    pub fn from_blocks(blocks: Vec<Block<T>>) -> Self {
        let blocks = blocks
            .into_iter()
            .map(|b| {
                let meta = BlockMetadata::for_block(&b);
                (Arc::new(b), meta)
            })
            .collect();
        Self { blocks }
    }

    /// A bundle holding exactly one block.
    #[must_use]
    pub fn single(block: Block<T>) -> Self {
        Self::from_blocks(vec![block])
    }

    /// Split `rows` into blocks of at most `rows_per_block` rows.
    ///
    /// An empty `rows` yields a bundle with no blocks.
    #[must_use]
    pub fn from_rows(rows: Vec<T>, rows_per_block: usize) -> Self {
        let chunk = rows_per_block.max(1);
        Self::from_blocks(rows.chunks(chunk).map(<[T]>::to_vec).collect())
    }

    /// Number of blocks in the bundle.
    #[must_use]
    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Total rows across all blocks.
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.blocks.iter().map(|(_, m)| m.num_rows).sum()
    }

    /// Total estimated size across all blocks.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.blocks.iter().map(|(_, m)| m.size_bytes).sum()
    }

    /// Borrow the block handles and their metadata.
    #[must_use]
    pub fn blocks(&self) -> &[(BlockRef<T>, BlockMetadata)] {
        &self.blocks
    }

    /// Iterate over the block handles only.
    pub fn block_refs(&self) -> impl Iterator<Item = &BlockRef<T>> {
        self.blocks.iter().map(|(b, _)| b)
    }

    /// Copy all rows out of the bundle in block order.
    #[must_use]
    pub fn rows(&self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.num_rows());
        for b in self.block_refs() {
            out.extend(b.iter().cloned());
        }
        out
    }
}

/// Sum of block counts across bundles.
pub fn total_blocks<T: RowBound>(refs: &[RefBundle<T>]) -> usize {
    refs.iter().map(RefBundle::num_blocks).sum()
}
