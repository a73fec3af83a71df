use ironshuffle::block::total_blocks;
use ironshuffle::{BlockMetadata, RefBundle};

#[test]
fn from_rows_chunks_into_blocks() {
    let b = RefBundle::from_rows((0u32..10).collect(), 4);
    assert_eq!(b.num_blocks(), 3);
    assert_eq!(b.num_rows(), 10);
    assert_eq!(b.size_bytes(), 40);
    assert_eq!(b.rows(), (0u32..10).collect::<Vec<_>>());
}

#[test]
fn empty_rows_make_an_empty_bundle() {
    let b = RefBundle::<u32>::from_rows(Vec::new(), 4);
    assert_eq!(b.num_blocks(), 0);
    assert_eq!(b.num_rows(), 0);
}

#[test]
fn metadata_estimates_size_from_row_type() {
    assert_eq!(
        BlockMetadata::for_block(&vec![1u64, 2, 3]),
        BlockMetadata {
            num_rows: 3,
            size_bytes: 24
        }
    );
}

#[test]
fn total_blocks_sums_bundles() {
    let bundles = vec![
        RefBundle::from_blocks(vec![vec![1u8], vec![2]]),
        RefBundle::from_blocks(vec![vec![3], vec![4], vec![5]]),
        RefBundle::single(vec![6]),
    ];
    assert_eq!(total_blocks(&bundles), 6);
}
