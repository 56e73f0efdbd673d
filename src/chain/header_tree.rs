//! The append-only header forest.
//!
//! Every admitted header lives here, keyed by identity hash and rooted at
//! the network genesis header. The tree derives height and cumulative work
//! at insertion, maintains the leaf index, and records the validation state
//! fed in by the block-validation collaborator. Nothing is ever removed.

use std::collections::{BTreeSet, HashMap};

use bitcoin::BlockHash;

use crate::chain::ChainWork;
use crate::types::{HashedHeader, ValidationLevel};

/// A header as stored in the tree, together with its derived position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderRecord {
    /// The header and its identity hash.
    pub header: HashedHeader,
    /// Height above genesis, derived from the parent at insertion.
    pub height: u32,
    /// Cumulative work from genesis through this header.
    pub chain_work: ChainWork,
    /// Externally fed validation level. New records start headers-only.
    pub validation: ValidationLevel,
    /// Set when block validation failed for this header's block.
    pub known_invalid: bool,
    /// Set when an external lock conflicts with this header's chain.
    pub conflicting: bool,
}

impl HeaderRecord {
    fn new(header: HashedHeader, height: u32, chain_work: ChainWork) -> Self {
        Self {
            header,
            height,
            chain_work,
            validation: ValidationLevel::HeadersOnly,
            known_invalid: false,
            conflicting: false,
        }
    }
}

/// Outcome of a tree insertion attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The header was added at the given height.
    Accepted {
        height: u32,
    },
    /// The header was already present; the tree is unchanged.
    AlreadyKnown,
    /// The parent hash is unknown; the tree is unchanged.
    RejectedUnconnecting,
}

/// Append-only forest of block headers rooted at genesis.
pub struct HeaderTree {
    records: HashMap<BlockHash, HeaderRecord>,
    // Sorted so tip enumeration is deterministic without an extra pass.
    tips: BTreeSet<BlockHash>,
    genesis_hash: BlockHash,
    // Tip of the best fully-validated chain; starts at genesis.
    best_validated: BlockHash,
}

impl HeaderTree {
    /// Create a tree seeded with the given genesis header.
    ///
    /// Genesis is the one record that starts fully validated: it defines the
    /// active chain until the block-validation collaborator reports deeper
    /// progress.
    pub fn new(genesis: HashedHeader) -> Self {
        let genesis_hash = *genesis.hash();
        let work = ChainWork::from_header(genesis.header());

        let mut record = HeaderRecord::new(genesis, 0, work);
        record.validation = ValidationLevel::FullyValidated;

        let mut records = HashMap::new();
        records.insert(genesis_hash, record);

        let mut tips = BTreeSet::new();
        tips.insert(genesis_hash);

        Self {
            records,
            tips,
            genesis_hash,
            best_validated: genesis_hash,
        }
    }

    /// Insert a header whose parent is already present.
    ///
    /// Duplicate insertion is a no-op, never an error. The caller is
    /// expected to have run the admission gates first; this only enforces
    /// the structural invariants (connectivity, uniqueness).
    pub fn insert(&mut self, header: HashedHeader) -> InsertOutcome {
        let hash = *header.hash();
        if self.records.contains_key(&hash) {
            return InsertOutcome::AlreadyKnown;
        }

        let (height, chain_work) = match self.records.get(&header.prev_blockhash()) {
            Some(parent) => {
                (parent.height + 1, parent.chain_work.add_header(header.header()))
            }
            None => return InsertOutcome::RejectedUnconnecting,
        };

        self.tips.remove(&header.prev_blockhash());
        self.tips.insert(hash);
        self.records.insert(hash, HeaderRecord::new(header, height, chain_work));

        tracing::debug!("Accepted header {} at height {}", hash, height);
        InsertOutcome::Accepted {
            height,
        }
    }

    /// Look up a stored record by identity hash.
    pub fn get(&self, hash: &BlockHash) -> Option<&HeaderRecord> {
        self.records.get(hash)
    }

    /// Whether a header with this hash has been admitted.
    pub fn contains(&self, hash: &BlockHash) -> bool {
        self.records.contains_key(hash)
    }

    /// The genesis hash this tree is rooted at.
    pub fn genesis_hash(&self) -> &BlockHash {
        &self.genesis_hash
    }

    /// Current leaves, ordered by hash.
    pub fn tips(&self) -> impl Iterator<Item = &BlockHash> {
        self.tips.iter()
    }

    /// Number of admitted headers, genesis included.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True only for a freshly constructed tree with nothing but genesis.
    pub fn is_empty(&self) -> bool {
        self.records.len() <= 1
    }

    /// Walk from `hash` toward genesis and return the ancestor at `height`.
    ///
    /// Returns the record for `hash` itself when heights are equal, and
    /// `None` when `hash` is unknown or sits below the requested height.
    pub fn ancestor_at(&self, hash: &BlockHash, height: u32) -> Option<&HeaderRecord> {
        let mut current = self.records.get(hash)?;
        if current.height < height {
            return None;
        }
        while current.height > height {
            current = self.records.get(&current.header.prev_blockhash())?;
        }
        Some(current)
    }

    /// Height of the last header shared between the chains ending at `a`
    /// and `b`. Both must be present in the tree.
    pub fn last_common_height(&self, a: &BlockHash, b: &BlockHash) -> Option<u32> {
        let record_a = self.records.get(a)?;
        let record_b = self.records.get(b)?;

        let height = record_a.height.min(record_b.height);
        let mut walk_a = self.ancestor_at(a, height)?;
        let mut walk_b = self.ancestor_at(b, height)?;

        while walk_a.header.hash() != walk_b.header.hash() {
            // Forest invariant: both walks terminate at genesis.
            walk_a = self.records.get(&walk_a.header.prev_blockhash())?;
            walk_b = self.records.get(&walk_b.header.prev_blockhash())?;
        }
        Some(walk_a.height)
    }

    /// Tip of the best fully-validated chain (the active chain).
    pub fn best_validated_tip(&self) -> &BlockHash {
        &self.best_validated
    }

    /// Record the validation level reported for an admitted header.
    ///
    /// A header that reaches full validation with more cumulative work than
    /// the current best becomes the new active-chain tip.
    pub fn set_validation_level(&mut self, hash: &BlockHash, level: ValidationLevel) -> bool {
        let best_work =
            self.records.get(&self.best_validated).map(|r| r.chain_work).unwrap_or_default();
        match self.records.get_mut(hash) {
            Some(record) => {
                record.validation = level;
                if level == ValidationLevel::FullyValidated
                    && !record.known_invalid
                    && record.chain_work > best_work
                {
                    self.best_validated = *hash;
                }
                true
            }
            None => false,
        }
    }

    /// Mark an admitted header's block as failed validation.
    ///
    /// Invalidating a header on the active chain demotes the active tip to
    /// the best fully-validated chain that avoids the invalid header.
    pub fn mark_invalid(&mut self, hash: &BlockHash) -> bool {
        let height = match self.records.get_mut(hash) {
            Some(record) => {
                record.known_invalid = true;
                record.height
            }
            None => return false,
        };
        tracing::warn!("Marked header {} invalid", hash);

        let active = self.best_validated;
        let on_active =
            self.ancestor_at(&active, height).is_some_and(|record| record.header.hash() == hash);
        if on_active {
            self.reselect_best_validated();
        }
        true
    }

    /// Pick the best-work fully-validated record whose chain holds no
    /// invalid header.
    fn reselect_best_validated(&mut self) {
        let mut best = self.genesis_hash;
        let mut best_work = ChainWork::zero();
        for (hash, record) in &self.records {
            if record.validation == ValidationLevel::FullyValidated
                && record.chain_work > best_work
                && !self.chain_has_invalid(hash)
            {
                best = *hash;
                best_work = record.chain_work;
            }
        }
        self.best_validated = best;
        tracing::info!("Active tip demoted to {}", best);
    }

    fn chain_has_invalid(&self, hash: &BlockHash) -> bool {
        let mut current = self.records.get(hash);
        while let Some(record) = current {
            if record.known_invalid {
                return true;
            }
            if record.height == 0 {
                break;
            }
            current = self.records.get(&record.header.prev_blockhash());
        }
        false
    }

    /// Mark an admitted header as conflicting with an external lock.
    pub fn mark_conflicting(&mut self, hash: &BlockHash) -> bool {
        match self.records.get_mut(hash) {
            Some(record) => {
                record.conflicting = true;
                true
            }
            None => false,
        }
    }
}
