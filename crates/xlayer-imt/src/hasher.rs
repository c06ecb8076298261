//! Keccak256 hasher for tree nodes

use tiny_keccak::{Hasher, Keccak};

use crate::{
    error::{MerkleError, Result},
    Node,
};

const NODE_LEN: usize = 32;

/// Two-to-one node compression used by the tree and the verifier.
///
/// Implementations must be deterministic and pure. Proofs only verify when the
/// prover and the verifier use the same hasher.
pub trait NodeHasher {
    /// Compute the parent of `left` and `right`
    fn combine(&self, left: &Node, right: &Node) -> Node;

    /// Compute the parent of two raw byte slices.
    ///
    /// Fails with [`MerkleError::InvalidInputLength`] unless both slices are
    /// exactly 32 bytes long.
    fn try_combine(&self, left: &[u8], right: &[u8]) -> Result<Node> {
        if left.len() != NODE_LEN || right.len() != NODE_LEN {
            return Err(MerkleError::InvalidInputLength { left: left.len(), right: right.len() });
        }
        Ok(self.combine(&Node::from_slice(left), &Node::from_slice(right)))
    }
}

impl<H: NodeHasher + ?Sized> NodeHasher for &H {
    fn combine(&self, left: &Node, right: &Node) -> Node {
        (**self).combine(left, right)
    }
}

/// Keccak256 hasher
///
/// `combine(left, right) = keccak256(left || right)`, the same bytes Solidity
/// hashes for `keccak256(abi.encodePacked(left, right))` with two `bytes32`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Keccak256Hasher;

impl Keccak256Hasher {
    /// Hash two 32-byte values together
    pub fn hash_pair(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
        let mut hasher = Keccak::v256();
        hasher.update(left);
        hasher.update(right);
        let mut output = [0u8; 32];
        hasher.finalize(&mut output);
        output
    }

    /// Hash arbitrary bytes, e.g. a payload before it is inserted as a leaf
    pub fn hash(data: &[u8]) -> Node {
        let mut hasher = Keccak::v256();
        hasher.update(data);
        let mut output = [0u8; 32];
        hasher.finalize(&mut output);
        Node::from(output)
    }
}

impl NodeHasher for Keccak256Hasher {
    fn combine(&self, left: &Node, right: &Node) -> Node {
        Node::from(Self::hash_pair(&left.0, &right.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_empty() {
        // keccak256("")
        assert_eq!(
            hex::encode(Keccak256Hasher::hash(&[])),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_combine_is_raw_concatenation() {
        let left = Node::repeat_byte(1);
        let right = Node::repeat_byte(2);

        let mut packed = Vec::with_capacity(64);
        packed.extend_from_slice(left.as_slice());
        packed.extend_from_slice(right.as_slice());

        assert_eq!(Keccak256Hasher.combine(&left, &right), Keccak256Hasher::hash(&packed));
        assert_ne!(
            Keccak256Hasher.combine(&left, &right),
            Keccak256Hasher.combine(&right, &left)
        );
    }

    #[test]
    fn test_combine_zero_pair() {
        let zero = Node::ZERO;
        assert_eq!(
            hex::encode(Keccak256Hasher.combine(&zero, &zero)),
            "ad3228b676f7d3cd4284a5443f17f1962b36e491b30a40b2405849e597ba5fb5"
        );
    }

    #[test]
    fn test_try_combine_checks_lengths() {
        let ok = Keccak256Hasher.try_combine(&[7u8; 32], &[9u8; 32]).unwrap();
        assert_eq!(ok, Keccak256Hasher.combine(&Node::repeat_byte(7), &Node::repeat_byte(9)));

        assert_eq!(
            Keccak256Hasher.try_combine(&[0u8; 31], &[0u8; 32]),
            Err(MerkleError::InvalidInputLength { left: 31, right: 32 })
        );
        assert_eq!(
            Keccak256Hasher.try_combine(&[0u8; 32], &[0u8; 64]),
            Err(MerkleError::InvalidInputLength { left: 32, right: 64 })
        );
    }
}
