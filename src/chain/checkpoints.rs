//! Hardcoded per-network trust anchors.
//!
//! Checkpoints are `(height, hash)` pairs treated as ground truth. The table
//! for a network is loaded once at startup and never mutated afterwards;
//! genesis is always checkpoint zero so every height has a checkpoint at or
//! below it.

use bitcoin::{BlockHash, Network};

use crate::config::ChainConfig;
use crate::error::{ConfigError, ConfigResult};

// Chain-parameter data inherited from the upstream node implementation.
const MAINNET_CHECKPOINTS: &[(u32, &str)] = &[
    (11111, "0000000069e244f73d78e8fd29ba2fd2ed618bd6fa2ee92559f542fdb26e7c1d"),
    (33333, "000000002dd5588a74784eaa7ab0507a18ad16a236e7b1ce69f00d7ddfb5d0a6"),
    (74000, "0000000000573993a3c9e41ce34471c079dcf5f52a0e824a81e7f953b8661a20"),
    (105000, "00000000000291ce28027faea320c8d2b054b2e0fe44a773f3eefb151d6bdc97"),
    (134444, "00000000000005b12ffd4cd315cd34ffd4a594f430ac814c91184a0d42d2b0fe"),
    (168000, "000000000000099e61ea72015e79632f216fe2cb33d7899acb35b75c8303b763"),
    (193000, "000000000000059f452a5f7340de6682a977387c17010ff6e6c3bd83ca8b1317"),
    (210000, "000000000000048b95347e83192f69cf0366076336c639f9b7228e9ba171342e"),
    (216116, "00000000000001b4f4b433e81ee46494af945cf96014816a4e2370f11b23df4e"),
    (225430, "00000000000001c108384350f74090433e7fcf79a606b8e797f065b130575932"),
    (250000, "000000000000003887df1f29024b06fc2200b55f8af8f35453d7be294df2d214"),
    (279000, "0000000000000001ae8c72a0b0c301f67e3afca10e819efa9041e458e9bd7e40"),
    (295000, "00000000000000004d9b4ef50f0f9d686fd69db2e03af35a100370c64632a983"),
];

const TESTNET_CHECKPOINTS: &[(u32, &str)] =
    &[(546, "000000002a936ca763904c3c35fce2f3556c559c0214345d31b1bcebf76acb70")];

fn network_checkpoints(network: Network) -> &'static [(u32, &'static str)] {
    match network {
        Network::Bitcoin => MAINNET_CHECKPOINTS,
        Network::Testnet => TESTNET_CHECKPOINTS,
        // Other networks carry no hardcoded checkpoints; genesis alone
        // anchors the table.
        _ => &[],
    }
}

/// A single `(height, hash)` trust anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    height: u32,
    hash: BlockHash,
}

impl Checkpoint {
    /// Create a new checkpoint entry.
    pub fn new(height: u32, hash: BlockHash) -> Self {
        Self {
            height,
            hash,
        }
    }

    /// Height this checkpoint anchors.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The required hash at this height.
    pub fn hash(&self) -> &BlockHash {
        &self.hash
    }
}

/// Immutable checkpoint table for one network.
///
/// Entries are sorted by height, start at genesis (height 0) and are unique.
#[derive(Debug, Clone)]
pub struct CheckpointManager {
    checkpoints: Vec<Checkpoint>,
}

impl CheckpointManager {
    /// Load the table for the network selected by `config`, merging any
    /// extra entries the configuration carries.
    pub fn from_config(config: &ChainConfig) -> ConfigResult<Self> {
        let genesis_hash = config.genesis_header().block_hash();

        let mut checkpoints = vec![Checkpoint::new(0, genesis_hash)];

        // Hardcoded anchors only apply to the canonical genesis; a custom
        // genesis selects a different chain entirely.
        if config.genesis.is_none() {
            for &(height, hex) in network_checkpoints(config.network) {
                let hash = hex.parse::<BlockHash>().map_err(|e| {
                    ConfigError::InvalidCheckpointHash {
                        height,
                        reason: e.to_string(),
                    }
                })?;
                checkpoints.push(Checkpoint::new(height, hash));
            }
        }

        for &(height, hash) in &config.extra_checkpoints {
            if height == 0 && hash != genesis_hash {
                return Err(ConfigError::GenesisConflict(height));
            }
            checkpoints.push(Checkpoint::new(height, hash));
        }

        checkpoints.sort_by_key(Checkpoint::height);
        checkpoints.dedup();

        for pair in checkpoints.windows(2) {
            if pair[0].height == pair[1].height {
                return Err(ConfigError::UnorderedCheckpoints(pair[1].height));
            }
        }

        Ok(Self {
            checkpoints,
        })
    }

    /// The checkpoint entry at exactly `height`, if one exists.
    pub fn checkpoint_at(&self, height: u32) -> Option<&Checkpoint> {
        self.checkpoints
            .binary_search_by_key(&height, |checkpoint| checkpoint.height)
            .ok()
            .map(|index| &self.checkpoints[index])
    }

    /// Iterate entries from highest to lowest.
    pub fn iter_descending(&self) -> impl Iterator<Item = &Checkpoint> {
        self.checkpoints.iter().rev()
    }

    /// Number of entries in the table.
    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    /// Whether the table holds only the genesis anchor.
    pub fn is_empty(&self) -> bool {
        self.checkpoints.len() <= 1
    }
}
