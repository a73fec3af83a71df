//! Seed selection for random shuffles.
//!
//! A shuffle without an explicit seed still has to be reproducible across task
//! retries: a retried reduce task must see rows in the same order as the first
//! attempt. The fallback seed is therefore derived from the clock once, when the
//! shuffle transform is built, and captured by value from then on.

use rand::SeedableRng;
use rand::rngs::StdRng;
use std::time::{SystemTime, UNIX_EPOCH};

/// Largest `i32`. Derived seeds are reduced modulo this value.
pub const INT32_MAX: i32 = i32::MAX;

/// RNG stream for map tasks.
pub const MAP_STREAM: u64 = 0x6d61_7000;
/// RNG stream for reduce tasks.
pub const REDUCE_STREAM: u64 = 0x7265_6400;

/// Use `explicit` when given, otherwise derive a seed from the clock.
#[must_use]
pub fn resolve_seed(explicit: Option<i32>) -> i32 {
    explicit.unwrap_or_else(seed_from_clock)
}

/// Wall-clock nanoseconds reduced into `[0, INT32_MAX)`.
#[allow(clippy::cast_possible_truncation)]
#[must_use]
pub fn seed_from_clock() -> i32 {
    // A clock before the epoch still yields a valid (zero) seed.
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos());
    (nanos % INT32_MAX.unsigned_abs() as u128) as i32
}

/// Deterministic RNG for task `idx` of the stage identified by `stream`.
///
/// Same `(seed, stream, idx)` always yields the same sequence.
#[allow(clippy::cast_sign_loss)]
#[must_use]
pub fn task_rng(seed: i32, stream: u64, idx: usize) -> StdRng {
    let mixed = ((seed as u32 as u64) << 32) ^ stream.rotate_left(17) ^ (idx as u64);
    StdRng::seed_from_u64(mixed)
}
