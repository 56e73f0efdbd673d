//! Cumulative chain work for comparing candidate chains.
//!
//! Work is the consensus 256-bit quantity `2^256 / (target + 1)` summed over
//! a chain; the chain with the most work wins tip selection.

use std::cmp::Ordering;
use std::ops::Add;

use bitcoin::block::Header as BlockHeader;
use bitcoin::pow::Target;

/// Cumulative chain work as a 256-bit big-endian integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainWork {
    work: [u8; 32],
}

impl ChainWork {
    /// Zero work.
    pub fn zero() -> Self {
        Self {
            work: [0u8; 32],
        }
    }

    /// Work contributed by a single header's declared target.
    pub fn from_header(header: &BlockHeader) -> Self {
        Self::from_target(header.target())
    }

    /// Work contributed by a single target.
    pub fn from_target(target: Target) -> Self {
        Self {
            work: target.to_work().to_be_bytes(),
        }
    }

    /// Extend this cumulative work with one more header.
    pub fn add_header(self, header: &BlockHeader) -> Self {
        self + Self::from_header(header)
    }

    /// The work as big-endian bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.work
    }

    /// Build from big-endian bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self {
            work: bytes,
        }
    }

}

impl Add for ChainWork {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        let mut result = [0u8; 32];
        let mut carry = 0u16;

        // Big-endian, so least significant byte is on the right
        for i in (0..32).rev() {
            let sum = self.work[i] as u16 + other.work[i] as u16 + carry;
            result[i] = (sum & 0xff) as u8;
            carry = sum >> 8;
        }

        Self {
            work: result,
        }
    }
}

impl Ord for ChainWork {
    fn cmp(&self, other: &Self) -> Ordering {
        self.work.cmp(&other.work)
    }
}

impl PartialOrd for ChainWork {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Default for ChainWork {
    fn default() -> Self {
        Self::zero()
    }
}

#[cfg(test)]
mod tests {
    use bitcoin::Network;

    use super::*;

    fn work_with_low_byte(value: u8) -> ChainWork {
        let mut bytes = [0u8; 32];
        bytes[31] = value;
        ChainWork::from_bytes(bytes)
    }

    #[test]
    fn test_chain_work_comparison() {
        let work1 = work_with_low_byte(0);
        let work2 = work_with_low_byte(1);

        assert!(work1 < work2);
        assert!(work2 > work1);
        assert_eq!(work1, work1);
    }

    #[test]
    fn test_chain_work_addition_carries() {
        let sum = work_with_low_byte(100) + work_with_low_byte(200);
        assert_eq!(sum.as_bytes()[31], 44); // 100 + 200 = 300 = 256 + 44
        assert_eq!(sum.as_bytes()[30], 1);
    }

    #[test]
    fn test_chain_work_from_genesis_header() {
        let genesis = bitcoin::constants::genesis_block(Network::Bitcoin).header;
        let work = ChainWork::from_header(&genesis);
        assert!(work > ChainWork::zero());
    }

    #[test]
    fn test_harder_target_means_more_work() {
        let mut harder = [0u8; 32];
        harder[8] = 0xff;
        let mut easier = [0u8; 32];
        easier[4] = 0xff;

        let harder_work = ChainWork::from_target(Target::from_be_bytes(harder));
        let easier_work = ChainWork::from_target(Target::from_be_bytes(easier));

        assert!(harder_work > easier_work);
    }
}
