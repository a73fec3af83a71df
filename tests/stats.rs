use anyhow::Result;
use ironshuffle::testing::*;
use ironshuffle::{DataContext, ShuffleStats, generate_random_shuffle_fn};
use serde_json::json;

fn run() -> Result<ShuffleStats> {
    let shuffle = generate_random_shuffle_fn::<u64>(
        &DataContext::default(),
        Some(17),
        None,
        Some(remote_args(&[("num_cpus", json!(1))])),
        None,
    );
    let (_, stats) = shuffle.apply(bundles_with_block_counts(&[2, 1], 6), &test_task_context())?;
    Ok(stats)
}

#[test]
fn stage_totals_account_for_every_row() -> Result<()> {
    let stats = run()?;
    assert_eq!(stats.total_rows("map"), 18);
    assert_eq!(stats.total_rows("reduce"), 18);
    assert_eq!(stats.total_rows("merge"), 0);
    assert_eq!(stats.stage("reduce").map(|s| s.blocks.len()), Some(3));
    Ok(())
}

#[test]
fn stats_export_as_json() -> Result<()> {
    let value = run()?.to_json()?;
    assert_eq!(value["strategy"], json!("pull_based"));
    assert_eq!(value["seed"], json!(17));
    assert_eq!(value["output_num_blocks"], json!(3));
    assert_eq!(value["map_remote_args"]["num_cpus"], json!(1));
    assert_eq!(value["stages"][0]["name"], json!("map"));
    Ok(())
}

#[test]
fn stats_save_to_file_round_trips() -> Result<()> {
    let stats = run()?;
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("stats.json");

    stats.save_to_file(&path)?;
    let loaded: ShuffleStats = serde_json::from_str(&std::fs::read_to_string(&path)?)?;

    assert_eq!(loaded, stats);
    Ok(())
}
