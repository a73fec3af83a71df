//! Process-wide shuffle configuration.
//!
//! [`DataContext`] holds the settings shared by every shuffle in the process:
//! which [`ShuffleStrategy`] to use, the default target block size, and the
//! push-based merge tuning. A context is read once when a shuffle transform is
//! built and the snapshot travels with the transform; nothing deeper in the call
//! stack looks at the global slot.
//!
//! # Example
//!
//! ```
//! use ironshuffle::context::{DataContext, ShuffleStrategy};
//!
//! let ctx = DataContext {
//!     shuffle_strategy: ShuffleStrategy::PushBased,
//!     ..Default::default()
//! };
//! assert_eq!(ctx.push_based_merge_factor, 2);
//! ```

use crate::error::ShuffleError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FormatResult};
use std::str::FromStr;
use std::sync::{LazyLock, RwLock};

/// Environment variable consulted by [`DataContext::from_env`].
pub const SHUFFLE_STRATEGY_ENV: &str = "IRONSHUFFLE_SHUFFLE_STRATEGY";

/// Default target block size: 128 MiB.
pub const DEFAULT_TARGET_MAX_BLOCK_SIZE: f64 = 128.0 * 1024.0 * 1024.0;

/// Resource requests attached to a stage's tasks.
///
/// The planner does not interpret these; it only decides which set a stage
/// receives and records it in the shuffle stats.
pub type RemoteArgs = BTreeMap<String, Value>;

/// Distributed execution strategy for all-to-all exchanges.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShuffleStrategy {
    /// Reducers pull their partition from every map output.
    #[default]
    PullBased,
    /// Map outputs are pushed to merge tasks in rounds before the final reduce.
    PushBased,
}

impl Display for ShuffleStrategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        match self {
            Self::PullBased => write!(f, "pull_based"),
            Self::PushBased => write!(f, "push_based"),
        }
    }
}

impl FromStr for ShuffleStrategy {
    type Err = ShuffleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "pull_based" | "default" => Ok(Self::PullBased),
            "push_based" => Ok(Self::PushBased),
            other => Err(ShuffleError::InvalidConfiguration(format!(
                "unknown shuffle strategy `{other}`"
            ))),
        }
    }
}

/// Shuffle settings shared across a process.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataContext {
    /// Strategy used by all-to-all shuffles.
    pub shuffle_strategy: ShuffleStrategy,
    /// Default target size for output blocks, in bytes.
    pub target_max_block_size: f64,
    /// Number of map outputs combined by a single push-based merge task.
    pub push_based_merge_factor: usize,
    /// Map tasks per push-based round. `None` means one per CPU.
    pub push_based_map_tasks_per_round: Option<usize>,
}

impl Default for DataContext {
    fn default() -> Self {
        Self {
            shuffle_strategy: ShuffleStrategy::PullBased,
            target_max_block_size: DEFAULT_TARGET_MAX_BLOCK_SIZE,
            push_based_merge_factor: 2,
            push_based_map_tasks_per_round: None,
        }
    }
}

static CURRENT: LazyLock<RwLock<DataContext>> = LazyLock::new(|| RwLock::new(DataContext::default()));

impl DataContext {
    /// Default context with the strategy taken from [`SHUFFLE_STRATEGY_ENV`] when set.
    ///
    /// # Errors
    ///
    /// Returns [`ShuffleError::InvalidConfiguration`] if the variable holds an
    /// unknown strategy name.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut ctx = Self::default();
        if let Ok(raw) = std::env::var(SHUFFLE_STRATEGY_ENV) {
            ctx.shuffle_strategy = raw.parse()?;
        }
        Ok(ctx)
    }

    /// Snapshot of the process-wide context.
    ///
    /// # Panics
    ///
    /// Panics if the context lock is poisoned.
    #[must_use]
    pub fn get_current() -> Self {
        CURRENT.read().unwrap().clone()
    }

    /// Replace the process-wide context.
    ///
    /// Transforms built earlier keep the snapshot they were built with.
    ///
    /// # Panics
    ///
    /// Panics if the context lock is poisoned.
    pub fn set_current(ctx: Self) {
        *CURRENT.write().unwrap() = ctx;
    }
}
