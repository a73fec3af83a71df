//! Typed errors raised by the shuffle planner itself.
//!
//! Operations return [`anyhow::Result`]. Errors the planner raises are
//! [`ShuffleError`] values and can be recovered with
//! `err.downcast_ref::<ShuffleError>()`. Errors raised while tasks run (for
//! example by an upstream transform) pass through untouched.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShuffleError {
    /// The requested options cannot be honored by the configured strategy.
    #[error("unsupported shuffle configuration: {0}")]
    UnsupportedConfiguration(String),

    /// A configuration value could not be parsed or is out of range.
    #[error("invalid shuffle configuration: {0}")]
    InvalidConfiguration(String),
}
