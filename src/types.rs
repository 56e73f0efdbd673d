//! Common type definitions for the header-chain library.

use std::fmt;

use bitcoin::block::Header as BlockHeader;
use bitcoin::consensus::{encode, Decodable};
use bitcoin::BlockHash;
use serde::{Deserialize, Serialize};

/// A block header paired with its identity hash.
///
/// The hash is computed once at construction and the fields are private, so
/// there is no reachable state in which the stored hash and the header fields
/// disagree. The only mutation path, [`HashedHeader::map`], rehashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashedHeader {
    header: BlockHeader,
    hash: BlockHash,
}

impl From<BlockHeader> for HashedHeader {
    fn from(header: BlockHeader) -> Self {
        Self {
            header,
            hash: header.block_hash(),
        }
    }
}

impl HashedHeader {
    /// The wrapped header.
    pub fn header(&self) -> &BlockHeader {
        &self.header
    }

    /// The identity hash of the wrapped header.
    pub fn hash(&self) -> &BlockHash {
        &self.hash
    }

    /// Hash of the parent header.
    pub fn prev_blockhash(&self) -> BlockHash {
        self.header.prev_blockhash
    }

    /// Apply a modification to the header fields, recomputing the identity
    /// hash. There is deliberately no way to change a field without going
    /// through this.
    pub fn map(self, f: impl FnOnce(&mut BlockHeader)) -> Self {
        let mut header = self.header;
        f(&mut header);
        Self::from(header)
    }
}

impl Decodable for HashedHeader {
    #[inline]
    fn consensus_decode<R: bitcoin::io::Read + ?Sized>(
        reader: &mut R,
    ) -> Result<Self, encode::Error> {
        Ok(Self::from(BlockHeader::consensus_decode(reader)?))
    }
}

impl fmt::Display for HashedHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hash)
    }
}

/// How far an accepted header's chain has been validated.
///
/// Header-level knowledge is all this crate establishes on its own; the
/// deeper levels are fed in by the block-validation collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationLevel {
    /// Only the header has been seen and admitted.
    HeadersOnly,

    /// Header-chain validation is complete but block data has not been
    /// fully checked.
    ValidHeaders,

    /// Blocks up to this header passed full validation.
    FullyValidated,
}

impl Default for ValidationLevel {
    fn default() -> Self {
        Self::HeadersOnly
    }
}

/// Status classification of a chain tip, as reported to RPC callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TipStatus {
    /// Tip of the current best fully-validated chain.
    Active,

    /// Fully validated fork that is not the best chain.
    ValidFork,

    /// Headers validated beyond header level, blocks not fully checked.
    ValidHeaders,

    /// Known through header admission only.
    HeadersOnly,

    /// Contains at least one block that failed validation.
    Invalid,

    /// Conflicts with an externally locked chain.
    Conflicting,

    /// Validation state could not be determined.
    Unknown,
}

impl fmt::Display for TipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TipStatus::Active => "active",
            TipStatus::ValidFork => "valid-fork",
            TipStatus::ValidHeaders => "valid-headers",
            TipStatus::HeadersOnly => "headers-only",
            TipStatus::Invalid => "invalid",
            TipStatus::Conflicting => "conflicting",
            TipStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}
