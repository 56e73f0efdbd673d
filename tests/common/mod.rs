//! Shared helpers for integration tests.

use bitcoin::consensus::encode::VarInt;
use bitcoin::consensus::Encodable;
use bitcoin::pow::Target;
use bitcoin::{CompactTarget, Network};

use header_chain::{ChainConfig, HashedHeader, HeaderChainManager, PowLimitPolicy};

/// Compact target easy enough that almost every nonce satisfies it.
pub const EASY_BITS: u32 = 0x2100ffff;

/// Regtest genesis rewritten to the easy target so test chains mine
/// instantly.
pub fn test_genesis() -> HashedHeader {
    let mut header = bitcoin::constants::genesis_block(Network::Regtest).header;
    header.bits = CompactTarget::from_consensus(EASY_BITS);
    HashedHeader::from(header)
}

/// Mine a child of `parent`: search the nonce space from `nonce_base` until
/// the header hash meets its own declared target.
pub fn mined_child(parent: &HashedHeader, nonce_base: u32) -> HashedHeader {
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

/// Mine a straight chain of `len` headers on top of `parent`.
///
/// Nonce search ranges are spaced out per height so sibling chains built
/// from the same parent do not collide.
pub fn mined_chain(parent: &HashedHeader, len: usize, nonce_base: u32) -> Vec<HashedHeader> {
    let mut chain = Vec::with_capacity(len);
    let mut tip = *parent;
    for i in 0..len {
        tip = mined_child(&tip, nonce_base + (i as u32) * 1000);
        chain.push(tip);
    }
    chain
}

/// Manager over the easy-target genesis, with the pow limit relaxed to
/// match.
pub fn easy_manager(config: ChainConfig) -> HeaderChainManager {
    let limit = Target::from_compact(CompactTarget::from_consensus(EASY_BITS));
    HeaderChainManager::with_policy(config, Box::new(PowLimitPolicy::new(limit)))
        .expect("valid test configuration")
}

/// Encode headers as a wire `headers` payload (varint count, each header
/// followed by a zero transaction count).
pub fn encode_headers_message(headers: &[HashedHeader]) -> Vec<u8> {
    let mut payload = Vec::new();
    VarInt(headers.len() as u64)
        .consensus_encode(&mut payload)
        .expect("vec write is infallible");
    for header in headers {
        header.header().consensus_encode(&mut payload).expect("vec write is infallible");
        VarInt(0).consensus_encode(&mut payload).expect("vec write is infallible");
    }
    payload
}
