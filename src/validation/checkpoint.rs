//! Checkpoint consistency enforcement.
//!
//! This is the DoS defense: once any admitted chain has crossed a trust
//! anchor, new chains forking at or below that anchor are worthless by
//! presumption and are rejected no matter how much work they carry, so the
//! node never spends resources growing junk branches below settled history.

use bitcoin::BlockHash;

use crate::chain::{CheckpointManager, HeaderTree};
use crate::types::HashedHeader;

/// Verdict of the checkpoint gate for one header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointCheck {
    /// No checkpoint rule applies.
    Pass,
    /// The header sits at a checkpoint height but carries the wrong hash.
    Mismatch {
        expected: BlockHash,
    },
    /// The header forks at or below a checkpoint some admitted chain has
    /// already surpassed.
    PriorToCheckpoint {
        checkpoint_height: u32,
    },
}

/// Applies the checkpoint table to incoming headers.
pub struct CheckpointEnforcer {
    checkpoints: CheckpointManager,
    enabled: bool,
}

impl CheckpointEnforcer {
    /// Create an enforcer over the given table. With `enabled` false the
    /// gate always passes (the `-nocheckpoints` behavior).
    pub fn new(checkpoints: CheckpointManager, enabled: bool) -> Self {
        Self {
            checkpoints,
            enabled,
        }
    }

    /// Whether enforcement is active.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The checkpoint table this enforcer applies.
    pub fn checkpoints(&self) -> &CheckpointManager {
        &self.checkpoints
    }

    /// Check a header that would be admitted at `height`.
    ///
    /// Rules, in order: an exact-height hash mismatch is rejected outright;
    /// a header at or below the highest checkpoint already reached by any
    /// admitted chain is rejected when its chain diverges from the settled
    /// one; a checkpoint no chain has reached yet imposes nothing.
    pub fn check(&self, header: &HashedHeader, height: u32, tree: &HeaderTree) -> CheckpointCheck {
        if !self.enabled {
            return CheckpointCheck::Pass;
        }

        if let Some(checkpoint) = self.checkpoints.checkpoint_at(height) {
            if checkpoint.hash() != header.hash() {
                return CheckpointCheck::Mismatch {
                    expected: *checkpoint.hash(),
                };
            }
            return CheckpointCheck::Pass;
        }

        if let Some(activated) = self.highest_activated(tree) {
            if height <= activated.height() {
                // The settled chain through the activated checkpoint owns
                // every height at or below it; anything else is a fork
                // below settled history.
                let settled = tree.ancestor_at(activated.hash(), height);
                let diverges =
                    settled.map_or(true, |record| record.header.hash() != header.hash());
                if diverges {
                    return CheckpointCheck::PriorToCheckpoint {
                        checkpoint_height: activated.height(),
                    };
                }
            }
        }

        CheckpointCheck::Pass
    }

    /// Highest checkpoint whose required block is present in the tree,
    /// genesis excluded (it is present by construction and would make
    /// every empty tree "checkpointed").
    fn highest_activated<'a>(
        &'a self,
        tree: &HeaderTree,
    ) -> Option<&'a crate::chain::Checkpoint> {
        self.checkpoints
            .iter_descending()
            .filter(|checkpoint| checkpoint.height() > 0)
            .find(|checkpoint| tree.contains(checkpoint.hash()))
    }
}
