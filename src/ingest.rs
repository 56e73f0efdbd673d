//! Header batch ingestion.
//!
//! One inbound `headers` message becomes one batch. The whole payload is
//! decoded before anything touches the tree, so a malformed batch never
//! partially applies; admission then runs strictly in order and halts at
//! the first rejection, leaving earlier acceptances in place.

use bitcoin::block::Header as BlockHeader;
use bitcoin::consensus::encode::VarInt;
use bitcoin::consensus::Decodable;
use bitcoin::BlockHash;
use rayon::prelude::*;

use crate::chain::{HeaderTree, InsertOutcome};
use crate::error::{DecodeError, DecodeResult};
use crate::types::HashedHeader;
use crate::validation::{CheckpointCheck, CheckpointEnforcer, DifficultyValidator};

/// Maximum number of headers in one protocol message.
pub const MAX_HEADERS_PER_BATCH: usize = 2000;

/// Why a header was refused admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The parent hash is not in the tree. May just be an out-of-order
    /// batch rather than an attack.
    Unconnecting,
    /// Proof-of-work is insufficient for the header's position.
    Difficulty,
    /// Wrong hash at a checkpoint height.
    CheckpointMismatch {
        expected: BlockHash,
    },
    /// Fork at or below a checkpoint an admitted chain already surpassed.
    PriorToCheckpoint {
        checkpoint_height: u32,
    },
}

impl RejectReason {
    /// Consensus-style reason string for logs and peer reporting.
    pub fn reason(&self) -> &'static str {
        match self {
            RejectReason::Unconnecting => "prev-blk-not-found",
            RejectReason::Difficulty => "bad-diffbits",
            RejectReason::CheckpointMismatch {
                ..
            } => "checkpoint mismatch",
            RejectReason::PriorToCheckpoint {
                ..
            } => "bad-fork-prior-to-checkpoint",
        }
    }
}

/// Admission verdict for one header of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Inserted into the tree at the given height.
    Accepted {
        height: u32,
    },
    /// Already present; informational, processing continues.
    AlreadyKnown,
    /// Refused; processing of the batch stops here.
    Rejected(RejectReason),
}

/// Per-header result reported back to the transport/peer layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderOutcome {
    /// Identity hash of the header this verdict applies to.
    pub hash: BlockHash,
    /// The verdict.
    pub admission: Admission,
}

impl HeaderOutcome {
    /// Whether this outcome halted its batch.
    pub fn is_rejection(&self) -> bool {
        matches!(self.admission, Admission::Rejected(_))
    }
}

/// Runs the per-header admission gates over decoded batches.
pub struct HeaderIngestionPipeline {
    difficulty: DifficultyValidator,
    checkpoints: CheckpointEnforcer,
}

impl HeaderIngestionPipeline {
    /// Create a pipeline from its two gates.
    pub fn new(difficulty: DifficultyValidator, checkpoints: CheckpointEnforcer) -> Self {
        Self {
            difficulty,
            checkpoints,
        }
    }

    /// The checkpoint enforcer this pipeline applies.
    pub fn checkpoint_enforcer(&self) -> &CheckpointEnforcer {
        &self.checkpoints
    }

    /// Decode a raw `headers` payload: varint count, then each header
    /// followed by a varint transaction count that must be zero.
    ///
    /// Identity hashes for the whole batch are computed in parallel.
    /// Any decode failure is fatal to the batch.
    pub fn decode_batch(&self, payload: &[u8]) -> DecodeResult<Vec<HashedHeader>> {
        let mut reader = payload;

        let count = VarInt::consensus_decode(&mut reader)?.0;
        if count as usize > MAX_HEADERS_PER_BATCH {
            return Err(DecodeError::OversizedBatch {
                count,
                max: MAX_HEADERS_PER_BATCH,
            });
        }

        let mut headers = Vec::with_capacity(count as usize);
        for index in 0..count as usize {
            let header = BlockHeader::consensus_decode(&mut reader)?;
            let tx_count = VarInt::consensus_decode(&mut reader)?.0;
            if tx_count != 0 {
                return Err(DecodeError::NonZeroTxCount {
                    index,
                });
            }
            headers.push(header);
        }

        if !reader.is_empty() {
            return Err(DecodeError::TrailingBytes(reader.len()));
        }

        Ok(headers.into_par_iter().map(HashedHeader::from).collect())
    }

    /// Process an already-decoded batch in order, mutating `tree`.
    ///
    /// Returns one outcome per examined header; the last outcome is the
    /// rejection when the batch halted early. Re-submitted known headers
    /// are reported and skipped without halting.
    pub fn process(&self, tree: &mut HeaderTree, headers: &[HashedHeader]) -> Vec<HeaderOutcome> {
        let mut outcomes = Vec::with_capacity(headers.len());

        for header in headers {
            let admission = self.admit(tree, header);
            let halt = matches!(admission, Admission::Rejected(_));
            outcomes.push(HeaderOutcome {
                hash: *header.hash(),
                admission,
            });
            if halt {
                break;
            }
        }

        outcomes
    }

    fn admit(&self, tree: &mut HeaderTree, header: &HashedHeader) -> Admission {
        if tree.contains(header.hash()) {
            return Admission::AlreadyKnown;
        }

        let Some(parent) = tree.get(&header.prev_blockhash()) else {
            tracing::debug!("Header {}: prev-blk-not-found", header.hash());
            return Admission::Rejected(RejectReason::Unconnecting);
        };
        let height = parent.height + 1;

        if let Err(failure) = self.difficulty.check(header, parent, tree) {
            tracing::warn!("Header {} rejected: {}", header.hash(), failure.reason());
            return Admission::Rejected(RejectReason::Difficulty);
        }

        match self.checkpoints.check(header, height, tree) {
            CheckpointCheck::Pass => {}
            CheckpointCheck::Mismatch {
                expected,
            } => {
                let reason = RejectReason::CheckpointMismatch {
                    expected,
                };
                tracing::warn!(
                    "Header {} rejected: {} (expected {} at height {})",
                    header.hash(),
                    reason.reason(),
                    expected,
                    height,
                );
                return Admission::Rejected(reason);
            }
            CheckpointCheck::PriorToCheckpoint {
                checkpoint_height,
            } => {
                let reason = RejectReason::PriorToCheckpoint {
                    checkpoint_height,
                };
                tracing::warn!(
                    "Header {} rejected: {} (checkpoint height {})",
                    header.hash(),
                    reason.reason(),
                    checkpoint_height,
                );
                return Admission::Rejected(reason);
            }
        }

        match tree.insert(*header) {
            InsertOutcome::Accepted {
                height,
            } => Admission::Accepted {
                height,
            },
            InsertOutcome::AlreadyKnown => Admission::AlreadyKnown,
            InsertOutcome::RejectedUnconnecting => {
                Admission::Rejected(RejectReason::Unconnecting)
            }
        }
    }
}
