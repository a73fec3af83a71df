use anyhow::Result;
use ironshuffle::context::{DEFAULT_TARGET_MAX_BLOCK_SIZE, SHUFFLE_STRATEGY_ENV};
use ironshuffle::testing::*;
use ironshuffle::{DataContext, RandomShuffleFn, ShuffleError, ShuffleRequest, ShuffleStrategy};

#[test]
fn default_context_is_pull_based() {
    let ctx = DataContext::default();
    assert_eq!(ctx.shuffle_strategy, ShuffleStrategy::PullBased);
    assert_eq!(ctx.target_max_block_size, DEFAULT_TARGET_MAX_BLOCK_SIZE);
    assert_eq!(ctx.push_based_merge_factor, 2);
    assert_eq!(ctx.push_based_map_tasks_per_round, None);
}

#[test]
fn strategy_parses_common_spellings() -> Result<()> {
    assert_eq!("push_based".parse::<ShuffleStrategy>()?, ShuffleStrategy::PushBased);
    assert_eq!("PUSH-BASED".parse::<ShuffleStrategy>()?, ShuffleStrategy::PushBased);
    assert_eq!(" pull_based ".parse::<ShuffleStrategy>()?, ShuffleStrategy::PullBased);
    assert_eq!("default".parse::<ShuffleStrategy>()?, ShuffleStrategy::PullBased);
    for s in [ShuffleStrategy::PullBased, ShuffleStrategy::PushBased] {
        assert_eq!(s.to_string().parse::<ShuffleStrategy>()?, s);
    }
    Ok(())
}

#[test]
fn unknown_strategy_is_a_configuration_error() {
    let err = "sort_merge".parse::<ShuffleStrategy>().unwrap_err();
    assert!(matches!(err, ShuffleError::InvalidConfiguration(_)));
}

#[test]
fn context_deserializes_with_defaults() -> Result<()> {
    let ctx: DataContext = serde_json::from_str(r#"{"shuffle_strategy": "push_based", "push_based_merge_factor": 4}"#)?;
    assert_eq!(ctx.shuffle_strategy, ShuffleStrategy::PushBased);
    assert_eq!(ctx.push_based_merge_factor, 4);
    assert_eq!(ctx.target_max_block_size, DEFAULT_TARGET_MAX_BLOCK_SIZE);
    Ok(())
}

#[test]
fn context_reads_strategy_from_environment() -> Result<()> {
    // SAFETY: no other test in this binary reads or writes this variable.
    unsafe { std::env::set_var(SHUFFLE_STRATEGY_ENV, "push_based") };
    let ctx = DataContext::from_env();
    unsafe { std::env::set_var(SHUFFLE_STRATEGY_ENV, "bogus") };
    let bad = DataContext::from_env();
    unsafe { std::env::remove_var(SHUFFLE_STRATEGY_ENV) };

    assert_eq!(ctx?.shuffle_strategy, ShuffleStrategy::PushBased);
    assert!(bad.is_err());
    assert_eq!(DataContext::from_env()?.shuffle_strategy, ShuffleStrategy::PullBased);
    Ok(())
}

#[test]
fn transform_keeps_the_context_it_was_built_with() -> Result<()> {
    let shuffle = RandomShuffleFn::<u64>::new(
        &DataContext::get_current(),
        ShuffleRequest::default().with_seed(1).with_num_outputs(3),
    );

    DataContext::set_current(DataContext {
        shuffle_strategy: ShuffleStrategy::PushBased,
        ..Default::default()
    });
    let result = shuffle.apply(bundles_with_block_counts(&[2], 4), &test_task_context());
    let current = DataContext::get_current();
    DataContext::set_current(DataContext::default());

    assert_eq!(current.shuffle_strategy, ShuffleStrategy::PushBased);
    assert_eq!(shuffle.data_context().shuffle_strategy, ShuffleStrategy::PullBased);
    assert_eq!(result?.0.len(), 3);
    Ok(())
}
