//! Chain-tip snapshots for external query.
//!
//! A tip is a header with no admitted child. The reporter derives the tip
//! set fresh from tree state on every call; identical tree state always
//! yields an identical snapshot.

use bitcoin::BlockHash;
use serde::{Deserialize, Serialize};

use crate::chain::HeaderTree;
use crate::types::{TipStatus, ValidationLevel};

/// One entry of a chain-tip snapshot, in the RPC wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainTip {
    /// Height of the tip header.
    pub height: u32,
    /// Identity hash of the tip header.
    pub hash: BlockHash,
    /// Number of headers between the tip and the point where its chain
    /// meets the active chain. Zero for the active tip itself.
    pub branchlen: u32,
    /// Status classification for this tip.
    pub status: TipStatus,
}

/// Derives chain-tip snapshots from a [`HeaderTree`].
pub struct TipReporter<'a> {
    tree: &'a HeaderTree,
}

impl<'a> TipReporter<'a> {
    /// Create a reporter over the given tree.
    pub fn new(tree: &'a HeaderTree) -> Self {
        Self {
            tree,
        }
    }

    /// Snapshot every leaf plus the active tip, ordered by descending
    /// height and then by hash.
    ///
    /// The active tip is always reported even when header-only chains have
    /// been admitted on top of it.
    pub fn snapshot(&self) -> Vec<ChainTip> {
        let active_tip = *self.tree.best_validated_tip();

        let mut tips: Vec<ChainTip> = self
            .tree
            .tips()
            .filter(|hash| **hash != active_tip)
            .filter_map(|hash| self.describe(hash, &active_tip))
            .collect();

        if let Some(active) = self.tree.get(&active_tip) {
            tips.push(ChainTip {
                height: active.height,
                hash: active_tip,
                branchlen: 0,
                status: TipStatus::Active,
            });
        }

        tips.sort_by(|a, b| b.height.cmp(&a.height).then_with(|| a.hash.cmp(&b.hash)));
        tips
    }

    fn describe(&self, hash: &BlockHash, active_tip: &BlockHash) -> Option<ChainTip> {
        let record = self.tree.get(hash)?;
        let fork_height = self.tree.last_common_height(hash, active_tip)?;

        Some(ChainTip {
            height: record.height,
            hash: *hash,
            branchlen: record.height - fork_height,
            status: classify(record.known_invalid, record.conflicting, record.validation),
        })
    }
}

fn classify(invalid: bool, conflicting: bool, validation: ValidationLevel) -> TipStatus {
    if invalid {
        return TipStatus::Invalid;
    }
    if conflicting {
        return TipStatus::Conflicting;
    }
    match validation {
        ValidationLevel::FullyValidated => TipStatus::ValidFork,
        ValidationLevel::ValidHeaders => TipStatus::ValidHeaders,
        ValidationLevel::HeadersOnly => TipStatus::HeadersOnly,
    }
}
