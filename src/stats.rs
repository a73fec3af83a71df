//! Execution statistics returned by a shuffle.
//!
//! Every scheduler reports one [`StageStats`] per stage it ran (`map`, `merge`,
//! `reduce`) along with the parameters the shuffle actually executed with. The
//! stats can be inspected directly, exported as JSON, printed, or saved to a file.
//!
//! # Example
//!
//! ```no_run
//! use ironshuffle::stats::ShuffleStats;
//!
//! # fn report(stats: &ShuffleStats) -> anyhow::Result<()> {
//! stats.print();
//! stats.save_to_file("shuffle_stats.json")?;
//! # Ok(())
//! # }
//! ```

use crate::block::BlockMetadata;
use crate::context::{RemoteArgs, ShuffleStrategy};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

/// Stage name for map tasks.
pub const MAP_STAGE: &str = "map";
/// Stage name for push-based merge tasks.
pub const MERGE_STAGE: &str = "merge";
/// Stage name for reduce tasks.
pub const REDUCE_STAGE: &str = "reduce";

/// Statistics for one stage of a shuffle.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageStats {
    /// Stage name.
    pub name: String,
    /// Number of tasks that ran.
    pub num_tasks: usize,
    /// Metadata of every block the stage produced.
    pub blocks: Vec<BlockMetadata>,
    /// Wall-clock time spent in the stage.
    pub wall_time: Duration,
}

impl StageStats {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Fold one batch of finished tasks into the stage.
    pub(crate) fn record(&mut self, num_tasks: usize, blocks: Vec<BlockMetadata>, elapsed: Duration) {
        self.num_tasks += num_tasks;
        self.blocks.extend(blocks);
        self.wall_time += elapsed;
    }

    /// Rows across all output blocks of the stage.
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.blocks.iter().map(|m| m.num_rows).sum()
    }
}

/// Everything a scheduler reports about one shuffle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShuffleStats {
    /// Strategy that executed the shuffle.
    pub strategy: ShuffleStrategy,
    /// Seed used by every map and reduce task.
    pub seed: i32,
    /// Number of output blocks requested.
    pub output_num_blocks: usize,
    /// Number of input blocks actually mapped.
    pub num_input_blocks: usize,
    /// Resource requests used for map (and merge) tasks.
    pub map_remote_args: Option<RemoteArgs>,
    /// Resource requests used for reduce tasks.
    pub reduce_remote_args: Option<RemoteArgs>,
    /// Per-stage statistics in execution order.
    pub stages: Vec<StageStats>,
}

impl ShuffleStats {
    /// Stats for the stage called `name`, if it ran.
    #[must_use]
    pub fn stage(&self, name: &str) -> Option<&StageStats> {
        self.stages.iter().find(|s| s.name == name)
    }

    /// Rows produced by the stage called `name`; zero if it did not run.
    #[must_use]
    pub fn total_rows(&self, name: &str) -> usize {
        self.stage(name).map_or(0, StageStats::num_rows)
    }

    /// Total wall-clock time across stages.
    #[must_use]
    pub fn wall_time(&self) -> Duration {
        self.stages.iter().map(|s| s.wall_time).sum()
    }

    /// All stats as a JSON object.
    ///
    /// # Errors
    ///
    /// Returns an error if the stats cannot be serialized.
    pub fn to_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Print a human-readable summary to stdout.
    pub fn print(&self) {
        println!("\n========== Shuffle Stats ==========");
        println!(
            "Strategy: {} | seed: {} | outputs: {} | inputs: {}",
            self.strategy, self.seed, self.output_num_blocks, self.num_input_blocks
        );
        println!("-----------------------------------");
        for stage in &self.stages {
            println!(
                "{:<8} tasks: {:>6} blocks: {:>6} rows: {:>10} time: {:.3}s",
                stage.name,
                stage.num_tasks,
                stage.blocks.len(),
                stage.num_rows(),
                stage.wall_time.as_secs_f64()
            );
        }
        println!("===================================\n");
    }

    /// Save all stats to a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written to.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let formatted = serde_json::to_string_pretty(&self.to_json()?)?;
        let mut file = File::create(path)?;
        file.write_all(formatted.as_bytes())?;
        Ok(())
    }
}
