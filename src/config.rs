//! Configuration for the header-admission subsystem.

use bitcoin::block::Header as BlockHeader;
use bitcoin::{BlockHash, Network};

/// Configuration for a [`HeaderChainManager`].
///
/// All fields are read once when the manager is built; there is no mid-run
/// reconfiguration. In particular the checkpoint-enforcement toggle holds
/// for the lifetime of the manager.
///
/// [`HeaderChainManager`]: crate::manager::HeaderChainManager
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// Network whose genesis header and checkpoint table are active.
    pub network: Network,

    /// Whether checkpoint enforcement is active. When false the
    /// checkpoint gate always passes.
    pub enforce_checkpoints: bool,

    /// Additional `(height, hash)` trust anchors merged into the network's
    /// hardcoded table at load time.
    pub extra_checkpoints: Vec<(u32, BlockHash)>,

    /// Genesis header override for private networks and tests. When unset,
    /// the network's canonical genesis header is used.
    pub genesis: Option<BlockHeader>,
}

impl ChainConfig {
    /// Create a new configuration for the given network.
    pub fn new(network: Network) -> Self {
        Self {
            network,
            enforce_checkpoints: true,
            extra_checkpoints: Vec::new(),
            genesis: None,
        }
    }

    /// Create a configuration for mainnet.
    pub fn mainnet() -> Self {
        Self::new(Network::Bitcoin)
    }

    /// Create a configuration for testnet.
    pub fn testnet() -> Self {
        Self::new(Network::Testnet)
    }

    /// Create a configuration for regtest.
    pub fn regtest() -> Self {
        Self::new(Network::Regtest)
    }

    /// Disable checkpoint enforcement (the `-nocheckpoints` behavior).
    pub fn without_checkpoints(mut self) -> Self {
        self.enforce_checkpoints = false;
        self
    }

    /// Add a trust anchor on top of the network's hardcoded table.
    pub fn with_checkpoint(mut self, height: u32, hash: BlockHash) -> Self {
        self.extra_checkpoints.push((height, hash));
        self
    }

    /// Use a custom genesis header instead of the network default.
    pub fn with_genesis(mut self, genesis: BlockHeader) -> Self {
        self.genesis = Some(genesis);
        self
    }

    /// The genesis header this configuration selects.
    pub fn genesis_header(&self) -> BlockHeader {
        self.genesis.unwrap_or_else(|| bitcoin::constants::genesis_block(self.network).header)
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self::mainnet()
    }
}
