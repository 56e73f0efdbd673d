//! The header-chain manager, the crate's top-level handle.
//!
//! Owns the header tree behind a read-write lock and wires the admission
//! pipeline to it. Batch processing takes the write lock once for the whole
//! batch, so a batch is applied atomically with respect to queries; queries
//! take read locks and never block each other.

use std::sync::RwLock;

use bitcoin::{BlockHash, Network};

use crate::chain::{ChainTip, CheckpointManager, HeaderRecord, HeaderTree, TipReporter};
use crate::config::ChainConfig;
use crate::error::{HeaderChainError, Result};
use crate::ingest::{HeaderIngestionPipeline, HeaderOutcome};
use crate::types::{HashedHeader, ValidationLevel};
use crate::validation::{CheckpointEnforcer, DifficultyPolicy, DifficultyValidator};

/// Header-admission subsystem handle.
///
/// Shared-reference methods only; the manager is `Sync` and can be shared
/// across networking threads directly or behind an `Arc`.
pub struct HeaderChainManager {
    network: Network,
    tree: RwLock<HeaderTree>,
    pipeline: HeaderIngestionPipeline,
}

impl HeaderChainManager {
    /// Build a manager from configuration, with the network's fixed
    /// proof-of-work limit as the difficulty policy.
    pub fn new(config: ChainConfig) -> Result<Self> {
        let policy = DifficultyValidator::for_network(config.network);
        Self::build(config, policy)
    }

    /// Build a manager with an injected difficulty policy, for chains whose
    /// minimum-work rule is more than a fixed limit.
    pub fn with_policy(config: ChainConfig, policy: Box<dyn DifficultyPolicy>) -> Result<Self> {
        Self::build(config, DifficultyValidator::new(policy))
    }

    fn build(config: ChainConfig, difficulty: DifficultyValidator) -> Result<Self> {
        let checkpoints = CheckpointManager::from_config(&config)?;
        let enforcer = CheckpointEnforcer::new(checkpoints, config.enforce_checkpoints);

        let genesis = HashedHeader::from(config.genesis_header());
        tracing::info!(
            "Initializing header chain for {} from genesis {}",
            config.network,
            genesis.hash(),
        );

        Ok(Self {
            network: config.network,
            tree: RwLock::new(HeaderTree::new(genesis)),
            pipeline: HeaderIngestionPipeline::new(difficulty, enforcer),
        })
    }

    /// The network this manager validates for.
    pub fn network(&self) -> Network {
        self.network
    }

    /// Whether the checkpoint gate is active.
    pub fn checkpoints_enforced(&self) -> bool {
        self.pipeline.checkpoint_enforcer().is_enabled()
    }

    /// Decode a raw `headers` message and process the batch.
    ///
    /// The payload is decoded in full before the tree is touched, so a
    /// malformed message never applies partially.
    pub fn process_message(&self, payload: &[u8]) -> Result<Vec<HeaderOutcome>> {
        let headers = self.pipeline.decode_batch(payload)?;
        self.process_headers(&headers)
    }

    /// Run an already-decoded batch through the admission gates, in order,
    /// halting at the first rejection.
    pub fn process_headers(&self, headers: &[HashedHeader]) -> Result<Vec<HeaderOutcome>> {
        let mut tree = self.tree.write().map_err(poisoned)?;
        Ok(self.pipeline.process(&mut tree, headers))
    }

    /// Snapshot of every chain tip plus the active tip, RPC-shaped.
    pub fn chain_tips(&self) -> Result<Vec<ChainTip>> {
        let tree = self.tree.read().map_err(poisoned)?;
        Ok(TipReporter::new(&tree).snapshot())
    }

    /// Look up an admitted header and its derived position.
    pub fn header(&self, hash: &BlockHash) -> Result<Option<HeaderRecord>> {
        let tree = self.tree.read().map_err(poisoned)?;
        Ok(tree.get(hash).cloned())
    }

    /// Whether a header with this hash has been admitted.
    pub fn contains(&self, hash: &BlockHash) -> Result<bool> {
        let tree = self.tree.read().map_err(poisoned)?;
        Ok(tree.contains(hash))
    }

    /// Number of admitted headers, genesis included.
    pub fn header_count(&self) -> Result<usize> {
        let tree = self.tree.read().map_err(poisoned)?;
        Ok(tree.len())
    }

    /// Feed in the validation level the block-validation collaborator
    /// reached for an admitted header. Returns false for unknown hashes.
    pub fn set_validation_level(&self, hash: &BlockHash, level: ValidationLevel) -> Result<bool> {
        let mut tree = self.tree.write().map_err(poisoned)?;
        Ok(tree.set_validation_level(hash, level))
    }

    /// Mark an admitted header's block as failed validation.
    pub fn mark_invalid(&self, hash: &BlockHash) -> Result<bool> {
        let mut tree = self.tree.write().map_err(poisoned)?;
        Ok(tree.mark_invalid(hash))
    }

    /// Mark an admitted header as conflicting with an external lock.
    pub fn mark_conflicting(&self, hash: &BlockHash) -> Result<bool> {
        let mut tree = self.tree.write().map_err(poisoned)?;
        Ok(tree.mark_conflicting(hash))
    }
}

fn poisoned<G>(err: std::sync::PoisonError<G>) -> HeaderChainError {
    HeaderChainError::LockPoisoned(err.to_string())
}

#[cfg(test)]
mod tests {
    use bitcoin::pow::Target;
    use bitcoin::CompactTarget;

    use crate::ingest::Admission;
    use crate::types::TipStatus;
    use crate::validation::PowLimitPolicy;

    use super::*;

    const EASY_BITS: u32 = 0x2100ffff;

    fn test_genesis() -> HashedHeader {
        let mut header = bitcoin::constants::genesis_block(Network::Regtest).header;
        header.bits = CompactTarget::from_consensus(EASY_BITS);
        HashedHeader::from(header)
    }

    fn mined_child(parent: &HashedHeader, nonce_base: u32) -> HashedHeader {
        let mut header = *parent.header();
        header.prev_blockhash = *parent.hash();
        let target = Target::from_compact(header.bits);
        for nonce in nonce_base.. {
            header.nonce = nonce;
            if target.is_met_by(header.block_hash()) {
                break;
            }
        }
        HashedHeader::from(header)
    }

    fn easy_manager(config: ChainConfig) -> HeaderChainManager {
        let limit = Target::from_compact(CompactTarget::from_consensus(EASY_BITS));
        HeaderChainManager::with_policy(config, Box::new(PowLimitPolicy::new(limit))).unwrap()
    }

    #[test]
    fn accepts_a_connected_batch() {
        let genesis = test_genesis();
        let config = ChainConfig::regtest().with_genesis(*genesis.header());
        let manager = easy_manager(config);

        let h1 = mined_child(&genesis, 0);
        let h2 = mined_child(&h1, 1000);

        let outcomes = manager.process_headers(&[h1, h2]).unwrap();
        assert!(outcomes.iter().all(|o| matches!(
            o.admission,
            Admission::Accepted {
                ..
            }
        )));
        assert_eq!(manager.header_count().unwrap(), 3);
        assert!(manager.contains(h2.hash()).unwrap());
        assert_eq!(manager.header(h2.hash()).unwrap().unwrap().height, 2);
    }

    #[test]
    fn tips_reflect_validation_feed() {
        let genesis = test_genesis();
        let config = ChainConfig::regtest().with_genesis(*genesis.header());
        let manager = easy_manager(config);

        let h1 = mined_child(&genesis, 0);
        manager.process_headers(&[h1]).unwrap();
        manager.set_validation_level(h1.hash(), ValidationLevel::FullyValidated).unwrap();

        let tips = manager.chain_tips().unwrap();
        assert_eq!(tips.len(), 1);
        assert_eq!(tips[0].hash, *h1.hash());
        assert_eq!(tips[0].status, TipStatus::Active);
    }

    #[test]
    fn unknown_hash_queries_return_negatives() {
        let genesis = test_genesis();
        let config = ChainConfig::regtest().with_genesis(*genesis.header());
        let manager = easy_manager(config);

        let stranger = mined_child(&genesis, 0);
        assert!(!manager.contains(stranger.hash()).unwrap());
        assert!(manager.header(stranger.hash()).unwrap().is_none());
        assert!(!manager.mark_invalid(stranger.hash()).unwrap());
        assert!(!manager
            .set_validation_level(stranger.hash(), ValidationLevel::ValidHeaders)
            .unwrap());
    }
}
