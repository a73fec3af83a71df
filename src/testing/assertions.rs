//! Assertion helpers for shuffle outputs.

use crate::block::{RefBundle, RowBound};
use std::fmt::Debug;

/// All rows of `bundles`, in bundle and block order.
#[must_use]
pub fn collect_rows<T: RowBound>(bundles: &[RefBundle<T>]) -> Vec<T> {
    bundles.iter().flat_map(RefBundle::rows).collect()
}

/// Row count of every block in `bundles`, in order.
#[must_use]
pub fn block_row_counts<T: RowBound>(bundles: &[RefBundle<T>]) -> Vec<usize> {
    bundles
        .iter()
        .flat_map(|b| b.blocks().iter().map(|(_, m)| m.num_rows))
        .collect()
}

/// Assert that `actual` holds exactly the rows of `expected`, in any order.
///
/// # Panics
///
/// Panics if the two differ as multisets.
///
/// # Example
///
/// ```
/// use ironshuffle::testing::assert_is_permutation;
///
/// assert_is_permutation(&[3, 1, 2, 1], &[1, 1, 2, 3]);
/// ```
pub fn assert_is_permutation<T: Debug + Ord + Clone>(actual: &[T], expected: &[T]) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "Row count mismatch:\n  Expected: {}\n  Actual: {}",
        expected.len(),
        actual.len()
    );
    let mut a = actual.to_vec();
    let mut e = expected.to_vec();
    a.sort();
    e.sort();
    assert_eq!(a, e, "Rows differ (compared sorted)");
}

/// Assert that each bundle in `bundles` holds exactly one block.
///
/// # Panics
///
/// Panics on the first bundle with a different block count.
pub fn assert_single_block_bundles<T: RowBound>(bundles: &[RefBundle<T>]) {
    for (i, b) in bundles.iter().enumerate() {
        assert_eq!(b.num_blocks(), 1, "Bundle {i} holds {} blocks", b.num_blocks());
    }
}
