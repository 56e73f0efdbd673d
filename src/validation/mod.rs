//! Header-level validation gates.

pub mod checkpoint;
pub mod difficulty;

pub use checkpoint::{CheckpointCheck, CheckpointEnforcer};
pub use difficulty::{DifficultyFailure, DifficultyPolicy, DifficultyValidator, PowLimitPolicy};
