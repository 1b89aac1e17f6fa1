//! # Errors
//!
//! Construction of the primitives is the only place where the core can fail.
//! Everything after that either succeeds or blocks forever: a deadlocked gate or a starving
//! writer isn't reported, it's just waiting.
//!
//! The remaining variants belong to the demo harness (configuration and joining actors).

use thiserror::Error;

/// Result type alias used all over the crate
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// A mutex or a semaphore can't be created with the requested parameters
    #[error("failed to initialize {primitive}: {reason}")]
    Initialization {
        primitive: &'static str,
        reason: String,
    },

    /// A bounded channel needs at least one slot
    #[error("bounded channel capacity must be positive")]
    ZeroCapacity,

    #[error("no demo supplied, use one of {0}")]
    MissingDemo(String),

    #[error("unknown demo `{0}'")]
    UnknownDemo(String),

    #[error("invalid value `{value}' for option `{option}'")]
    InvalidOption { option: String, value: String },

    /// An actor thread panicked, the panic message goes to the log
    #[error("actor {0} panicked")]
    ActorPanicked(String),
}

impl Error {
    pub(crate) fn invalid_option(option: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidOption {
            option: option.into(),
            value: value.into(),
        }
    }
}
