//! Chain state: the header forest, trust anchors, work accounting, and
//! tip reporting.

pub mod chain_work;
pub mod checkpoints;
pub mod header_tree;
pub mod tips;

pub use chain_work::ChainWork;
pub use checkpoints::{Checkpoint, CheckpointManager};
pub use header_tree::{HeaderRecord, HeaderTree, InsertOutcome};
pub use tips::{ChainTip, TipReporter};
