//! Header-chain: block-header admission for a Bitcoin-family node.
//!
//! This library maintains the forest of admitted block headers and guards
//! its growth. Inbound header batches pass, per header and in order,
//! through connectivity, proof-of-work, and checkpoint gates; admitted
//! headers are stored with their derived height and cumulative work, and
//! the current set of chain tips can be queried at any time in the
//! `getchaintips` RPC shape.
//!
//! # Features
//!
//! - Append-only header tree rooted at the network genesis header
//! - Proof-of-work validation with a pluggable minimum-work policy
//! - Checkpoint enforcement rejecting forks below settled history
//! - Wire-format batch decoding with the 2000-header message limit
//! - Validation-level feed from an external block-validation collaborator
//! - Deterministic chain-tip snapshots with status classification
//!
//! # Example
//!
//! ```no_run
//! use header_chain::{ChainConfig, HeaderChainManager};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = HeaderChainManager::new(ChainConfig::mainnet())?;
//! let payload: Vec<u8> = vec![]; // a `headers` message from a peer
//! let outcomes = manager.process_message(&payload)?;
//! for tip in manager.chain_tips()? {
//!     println!("{} at height {}: {}", tip.hash, tip.height, tip.status);
//! }
//! # Ok(())
//! # }
//! ```

pub mod chain;
pub mod config;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod manager;
pub mod types;
pub mod validation;

pub use chain::{ChainTip, ChainWork, Checkpoint, CheckpointManager, HeaderRecord, HeaderTree};
pub use config::ChainConfig;
pub use error::{ConfigError, DecodeError, HeaderChainError, LoggingError, Result};
pub use ingest::{Admission, HeaderIngestionPipeline, HeaderOutcome, RejectReason};
pub use logging::{init_console_logging, init_logging, LoggingConfig, LoggingGuard};
pub use manager::HeaderChainManager;
pub use types::{HashedHeader, TipStatus, ValidationLevel};
pub use validation::{CheckpointEnforcer, DifficultyPolicy, DifficultyValidator, PowLimitPolicy};

// Re-export commonly used external types
pub use bitcoin::block::Header as BlockHeader;
pub use bitcoin::hashes::Hash;
pub use bitcoin::{BlockHash, Network};
pub use tracing::level_filters::LevelFilter;

/// Version of the header-chain library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
