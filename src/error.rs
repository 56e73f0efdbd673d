//! Error types for the header-chain library.
//!
//! Per-header admission verdicts (insufficient work, checkpoint conflicts and
//! so on) are not errors; they are reported as [`HeaderOutcome`] values so the
//! caller can decide peer-level consequences. The enums here cover the
//! conditions that abort an operation outright: malformed input, bad
//! configuration, and internal failures.
//!
//! [`HeaderOutcome`]: crate::ingest::HeaderOutcome

use thiserror::Error;

/// Main error type for the header-chain library.
#[derive(Debug, Error)]
pub enum HeaderChainError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

/// Configuration-related errors, raised while building a chain manager.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid checkpoint hash at height {height}: {reason}")]
    InvalidCheckpointHash { height: u32, reason: String },

    #[error("Checkpoint heights must be unique and ascending (offending height: {0})")]
    UnorderedCheckpoints(u32),

    #[error("Checkpoint at height {0} conflicts with the genesis header")]
    GenesisConflict(u32),
}

/// Wire-decoding errors for an inbound header batch.
///
/// Any of these is fatal to the whole batch: nothing from the batch is
/// applied to the tree.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Consensus encoding error: {0}")]
    Encoding(#[from] bitcoin::consensus::encode::Error),

    #[error("Batch of {count} headers exceeds the {max}-header message limit")]
    OversizedBatch { count: u64, max: usize },

    #[error("Header {index} carries a non-zero transaction count")]
    NonZeroTxCount { index: usize },

    #[error("{0} trailing bytes after the last header")]
    TrailingBytes(usize),
}

/// Logging-related errors.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Subscriber initialization failed: {0}")]
    SubscriberInit(String),
}

/// Type alias for Result with HeaderChainError.
pub type Result<T> = std::result::Result<T, HeaderChainError>;

/// Type alias for decode operation results.
pub type DecodeResult<T> = std::result::Result<T, DecodeError>;

/// Type alias for configuration results.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Type alias for logging operation results.
pub type LoggingResult<T> = std::result::Result<T, LoggingError>;
