use anyhow::Result;
use ironshuffle::shuffle_spec::split_even;
use ironshuffle::testing::*;
use ironshuffle::{
    DataContext, RefBundle, ShuffleError, ShuffleScheduler, ShuffleStrategy, ShuffleTaskSpec, build_shuffle_spec,
    select_scheduler,
};

fn spec(seed: i32) -> ShuffleTaskSpec<u64> {
    build_shuffle_spec(f64::INFINITY, seed, None)
}

fn push_context(merge_factor: usize, per_round: usize) -> DataContext {
    DataContext {
        shuffle_strategy: ShuffleStrategy::PushBased,
        push_based_merge_factor: merge_factor,
        push_based_map_tasks_per_round: Some(per_round),
        ..Default::default()
    }
}

#[test]
fn pull_based_is_selected_by_default() -> Result<()> {
    let s = select_scheduler(&DataContext::default(), Some(5), spec(1))?;
    assert_eq!(s.strategy(), ShuffleStrategy::PullBased);
    Ok(())
}

#[test]
fn push_based_is_configured_from_context() -> Result<()> {
    let s = select_scheduler(&push_context(4, 3), None, spec(1))?;
    let ShuffleScheduler::PushBased(push) = s else {
        panic!("expected the push-based scheduler");
    };
    assert_eq!(push.merge_factor(), 4);
    assert_eq!(push.map_tasks_per_round(), 3);
    Ok(())
}

#[test]
fn push_based_selection_rejects_output_count() {
    let err = select_scheduler(&push_context(2, 2), Some(4), spec(1)).expect_err("must reject");
    assert!(matches!(
        err.downcast_ref::<ShuffleError>(),
        Some(ShuffleError::UnsupportedConfiguration(_))
    ));
}

#[test]
fn pull_based_slices_rows_evenly_across_reducers() -> Result<()> {
    let s = select_scheduler(&DataContext::default(), Some(4), spec(1))?;
    let input = vec![RefBundle::single((0..10).collect())];

    let (out, stats) = s.execute(input, 4, &test_task_context(), None, None, None)?;

    assert_eq!(block_row_counts(&out), vec![3, 3, 3, 1]);
    let names: Vec<&str> = stats.stages.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["map", "reduce"]);
    assert_eq!(stats.stage("map").map(|s| s.num_tasks), Some(1));
    assert_eq!(stats.stage("reduce").map(|s| s.num_tasks), Some(4));
    Ok(())
}

#[test]
fn non_random_spec_preserves_order() -> Result<()> {
    let s = ShuffleScheduler::PullBased(ironshuffle::PullBasedShuffleTaskScheduler::new(ShuffleTaskSpec::new(
        f64::INFINITY,
        false,
        0,
        None,
    )));
    let input = vec![RefBundle::single((0..10).collect::<Vec<u64>>())];

    let (out, _) = s.execute(input, 4, &test_task_context(), None, None, None)?;

    let blocks: Vec<Vec<u64>> = out.iter().map(RefBundle::rows).collect();
    assert_eq!(blocks, vec![vec![0, 1, 2], vec![3, 4, 5], vec![6, 7, 8], vec![9]]);
    Ok(())
}

#[test]
fn push_based_runs_map_rounds_and_merges() -> Result<()> {
    let s = select_scheduler(&push_context(2, 2), None, spec(3))?;
    let input = bundles_with_block_counts(&[2, 3, 1], 5);

    let (out, stats) = s.execute(input.clone(), 6, &test_task_context(), None, None, None)?;

    let names: Vec<&str> = stats.stages.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["map", "merge", "reduce"]);
    let map = stats.stage("map").expect("map stage");
    let merge = stats.stage("merge").expect("merge stage");
    assert_eq!(map.num_tasks, 6);
    // Three rounds of two maps, one merge task per round.
    assert_eq!(merge.num_tasks, 3);
    assert_eq!(merge.blocks.len(), 18);
    assert_eq!(merge.num_rows(), 30);
    assert_eq!(out.len(), 6);
    assert_is_permutation(&collect_rows(&out), &collect_rows(&input));
    Ok(())
}

#[test]
fn push_based_merge_tasks_are_bounded_by_outputs() {
    let ctx = push_context(1, 8);
    let Ok(ShuffleScheduler::PushBased(push)) = select_scheduler(&ctx, None, spec(1)) else {
        panic!("expected the push-based scheduler");
    };
    assert_eq!(push.merge_tasks_per_round(3), 3);
    assert_eq!(push.merge_tasks_per_round(100), 8);
}

#[test]
fn scheduler_records_remote_args() -> Result<()> {
    let args = remote_args(&[("num_cpus", serde_json::json!(2))]);
    let s = select_scheduler(&DataContext::default(), None, spec(1))?;

    let (_, stats) = s.execute(
        bundles_with_block_counts(&[2], 3),
        2,
        &test_task_context(),
        Some(&args),
        None,
        None,
    )?;

    assert_eq!(stats.map_remote_args, Some(args));
    assert_eq!(stats.reduce_remote_args, None);
    Ok(())
}

#[test]
fn split_even_pads_with_empty_slices() {
    assert_eq!(split_even(vec![1, 2, 3], 5), vec![vec![1], vec![2], vec![3], vec![], vec![]]);
    assert_eq!(split_even(Vec::<u8>::new(), 2), vec![Vec::<u8>::new(), Vec::new()]);
    assert!(split_even(vec![1, 2], 0).is_empty());
}
