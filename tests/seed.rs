use ironshuffle::seed::{MAP_STREAM, REDUCE_STREAM, seed_from_clock, task_rng};
use ironshuffle::{INT32_MAX, resolve_seed};
use rand::RngCore;

#[test]
fn explicit_seed_is_returned_unchanged() {
    assert_eq!(resolve_seed(Some(5)), 5);
    assert_eq!(resolve_seed(Some(0)), 0);
    assert_eq!(resolve_seed(Some(-3)), -3);
}

#[test]
fn clock_seed_is_within_range() {
    for _ in 0..1000 {
        let s = seed_from_clock();
        assert!((0..INT32_MAX).contains(&s), "seed {s} out of range");
    }
    assert!((0..INT32_MAX).contains(&resolve_seed(None)));
}

#[test]
fn task_rng_is_deterministic() {
    let mut a = task_rng(42, MAP_STREAM, 7);
    let mut b = task_rng(42, MAP_STREAM, 7);
    let xs: Vec<u64> = (0..8).map(|_| a.next_u64()).collect();
    let ys: Vec<u64> = (0..8).map(|_| b.next_u64()).collect();
    assert_eq!(xs, ys);
}

#[test]
fn task_rng_streams_are_distinct() {
    let first = |seed, stream, idx| task_rng(seed, stream, idx).next_u64();
    assert_ne!(first(42, MAP_STREAM, 0), first(42, REDUCE_STREAM, 0));
    assert_ne!(first(42, MAP_STREAM, 0), first(42, MAP_STREAM, 1));
    assert_ne!(first(42, MAP_STREAM, 0), first(43, MAP_STREAM, 0));
}
