use anyhow::Result;
use ironshuffle::map_transformer::{BlockSizeLimit, rows_per_block, slice_rows};
use ironshuffle::{BlockMapTransformer, MapTransformer, TaskContext};

fn ctx() -> TaskContext<u64> {
    TaskContext::new("map", f64::INFINITY)
}

#[test]
fn chained_ops_run_in_order() -> Result<()> {
    let t = BlockMapTransformer::<u64>::new()
        .map(|x| x * 2)
        .filter(|x| *x > 2)
        .flat_map(|x| vec![*x, *x + 1]);
    assert_eq!(t.len(), 3);

    let out = t.apply_transform(vec![vec![1, 2, 3]], &ctx())?;

    assert_eq!(out, vec![vec![4, 5, 6, 7]]);
    Ok(())
}

#[test]
fn output_is_sliced_by_target_block_size() -> Result<()> {
    // u64 rows are 8 bytes, so a 16 byte target holds two rows.
    let t = BlockMapTransformer::<u64>::new().with_target_max_block_size(16.0);

    let out = t.apply_transform(vec![vec![1, 2, 3], vec![4, 5]], &ctx())?;

    assert_eq!(out, vec![vec![1, 2], vec![3, 4], vec![5]]);
    Ok(())
}

#[test]
fn infinite_target_keeps_a_single_block() -> Result<()> {
    let t = BlockMapTransformer::<u64>::new().with_target_max_block_size(16.0);
    t.set_target_max_block_size(f64::INFINITY);
    t.set_target_max_block_size(f64::INFINITY);

    let out = t.apply_transform(vec![vec![1, 2, 3], vec![4, 5]], &ctx())?;

    assert!(t.target_max_block_size().is_infinite());
    assert_eq!(out, vec![vec![1, 2, 3, 4, 5]]);
    Ok(())
}

#[test]
fn empty_output_has_no_blocks() -> Result<()> {
    let t = BlockMapTransformer::<u64>::new().filter(|_| false);
    assert!(t.apply_transform(vec![vec![1, 2, 3]], &ctx())?.is_empty());
    Ok(())
}

#[test]
fn rows_per_block_follows_row_size() {
    assert_eq!(rows_per_block::<u64>(16.0), Some(2));
    assert_eq!(rows_per_block::<u64>(1.0), Some(1));
    assert_eq!(rows_per_block::<u64>(f64::INFINITY), None);
    assert_eq!(rows_per_block::<()>(16.0), None);
    assert_eq!(slice_rows(vec![1u32, 2, 3], 4.0), vec![vec![1], vec![2], vec![3]]);
}

#[test]
fn block_size_limit_stores_infinity() {
    let limit = BlockSizeLimit::new(1024.0);
    assert_eq!(limit.get(), 1024.0);
    limit.set(f64::INFINITY);
    assert!(limit.get().is_infinite());
}
