//! Inclusion proof generation and verification

use serde::{Deserialize, Serialize};

use crate::{
    error::{MerkleError, Result},
    hasher::{Keccak256Hasher, NodeHasher},
    tree::{capacity_for, check_depth, zero_values},
    Node,
};

/// Inclusion proof for a single leaf
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// Index of the proven leaf
    pub index: u64,
    /// Sibling hashes from leaf to root, one per level
    pub siblings: Vec<Node>,
}

impl MerkleProof {
    /// Create a proof from an index and its leaf-to-root siblings
    pub const fn new(index: u64, siblings: Vec<Node>) -> Self {
        Self { index, siblings }
    }

    /// Depth of the tree this proof was generated for
    pub fn depth(&self) -> usize {
        self.siblings.len()
    }

    /// Fold `leaf` up the path and return the resulting root.
    ///
    /// Bit `i` of the index (least significant first) says whether the node at
    /// level `i` is a right child, in which case `siblings[i]` is on the left.
    pub fn compute_root<H: NodeHasher>(&self, hasher: &H, leaf: &Node) -> Node {
        self.siblings.iter().enumerate().fold(*leaf, |current, (level, sibling)| {
            let bit = u32::try_from(level)
                .ok()
                .and_then(|shift| self.index.checked_shr(shift))
                .unwrap_or(0)
                & 1;
            if bit == 1 {
                hasher.combine(sibling, &current)
            } else {
                hasher.combine(&current, sibling)
            }
        })
    }
}

/// Stateless verifier for a fixed tree depth.
///
/// Needs nothing from the tree besides its depth and hasher, so it can live
/// in a different process than the tree.
#[derive(Clone, Debug)]
pub struct InclusionVerifier<H = Keccak256Hasher> {
    depth: usize,
    hasher: H,
}

impl InclusionVerifier<Keccak256Hasher> {
    /// Keccak256 verifier for trees of the given depth
    pub const fn new(depth: usize) -> Self {
        Self { depth, hasher: Keccak256Hasher }
    }
}

impl<H: NodeHasher> InclusionVerifier<H> {
    /// Verifier using a custom hasher
    pub const fn with_hasher(depth: usize, hasher: H) -> Self {
        Self { depth, hasher }
    }

    /// Tree depth expected from proofs
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Check that `leaf` sits at `proof.index` under `expected_root`.
    ///
    /// Returns `Ok(false)` when the proof is well formed but does not match.
    /// Shape errors are reported before anything is hashed.
    pub fn verify(&self, leaf: &Node, proof: &MerkleProof, expected_root: &Node) -> Result<bool> {
        verify_inclusion(&self.hasher, self.depth, leaf, proof, expected_root)
    }
}

/// Verify an inclusion proof against `expected_root`.
///
/// Fails with [`MerkleError::InvalidDepth`] for a depth outside
/// `1..=MAX_DEPTH`, with [`MerkleError::MalformedProof`] when the proof does not have
/// exactly `depth` siblings and with [`MerkleError::IndexOutOfRange`] when the
/// index does not fit a tree of that depth.
pub fn verify_inclusion<H: NodeHasher>(
    hasher: &H,
    depth: usize,
    leaf: &Node,
    proof: &MerkleProof,
    expected_root: &Node,
) -> Result<bool> {
    check_depth(depth)?;
    if proof.siblings.len() != depth {
        return Err(MerkleError::MalformedProof { expected: depth, actual: proof.siblings.len() });
    }
    let bound = capacity_for(depth);
    if proof.index >= bound {
        return Err(MerkleError::IndexOutOfRange { index: proof.index, bound });
    }

    Ok(proof.compute_root(hasher, leaf) == *expected_root)
}

/// Build a proof from the complete, ordered list of inserted leaves.
///
/// Rebuilds every level from scratch, padding odd-length levels with the zero
/// value of that level. A sibling past the last real node is the zero value.
/// Produces the same proof as [`crate::IncrementalMerkleTree::prove_inclusion`]
/// on a tree holding `leaves`, at O(n) cost instead of O(depth).
pub fn prove_from_leaves<H: NodeHasher>(
    hasher: &H,
    depth: usize,
    leaves: &[Node],
    index: u64,
) -> Result<MerkleProof> {
    check_depth(depth)?;
    let capacity = capacity_for(depth);
    let count = leaves.len() as u64;
    if count > capacity {
        return Err(MerkleError::TreeFull { capacity });
    }
    if index >= count {
        return Err(MerkleError::IndexOutOfRange { index, bound: count });
    }

    let zeros = zero_values(hasher, depth);
    let mut siblings = Vec::with_capacity(depth);
    let mut layer = leaves.to_vec();
    let mut position = index as usize;

    for zero in zeros.iter().take(depth) {
        let sibling = layer.get(position ^ 1).copied().unwrap_or(*zero);
        siblings.push(sibling);

        if layer.len() % 2 == 1 {
            layer.push(*zero);
        }
        layer = layer.chunks_exact(2).map(|pair| hasher.combine(&pair[0], &pair[1])).collect();
        position /= 2;
    }

    Ok(MerkleProof { index, siblings })
}

/// Portable proof: the tuple handed to external verifiers.
///
/// Serializes with `0x`-prefixed hex strings for every hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionProof {
    /// Claimed leaf
    pub leaf: Node,
    /// Leaf index
    pub index: u64,
    /// Sibling hashes from leaf to root
    pub siblings: Vec<Node>,
    /// Root the proof was generated against
    pub root: Node,
}

impl InclusionProof {
    /// Bundle a leaf, its proof and the root it verifies against
    pub fn new(leaf: Node, proof: MerkleProof, root: Node) -> Self {
        Self { leaf, index: proof.index, siblings: proof.siblings, root }
    }

    /// Split off the index and siblings
    pub fn merkle_proof(&self) -> MerkleProof {
        MerkleProof { index: self.index, siblings: self.siblings.clone() }
    }

    /// Verify this proof with `verifier`
    pub fn verify<H: NodeHasher>(&self, verifier: &InclusionVerifier<H>) -> Result<bool> {
        verifier.verify(&self.leaf, &self.merkle_proof(), &self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(i: u64) -> Node {
        Keccak256Hasher::hash(&i.to_be_bytes())
    }

    #[test]
    fn test_compute_root_bit_order() {
        let h = Keccak256Hasher;
        let (a, b, c) = (leaf(0), leaf(1), leaf(2));

        // index 0b01: right child at level 0, left child at level 1
        let proof = MerkleProof::new(1, vec![b, c]);
        assert_eq!(proof.compute_root(&h, &a), h.combine(&h.combine(&b, &a), &c));

        // index 0b10: left child at level 0, right child at level 1
        let proof = MerkleProof::new(2, vec![b, c]);
        assert_eq!(proof.compute_root(&h, &a), h.combine(&c, &h.combine(&a, &b)));
    }

    #[test]
    fn test_verify_rejects_wrong_length() {
        let verifier = InclusionVerifier::new(3);
        let proof = MerkleProof::new(0, vec![Node::ZERO; 2]);
        assert_eq!(
            verifier.verify(&leaf(0), &proof, &Node::ZERO),
            Err(MerkleError::MalformedProof { expected: 3, actual: 2 })
        );
    }

    #[test]
    fn test_verify_rejects_index_past_capacity() {
        let verifier = InclusionVerifier::new(3);
        let proof = MerkleProof::new(8, vec![Node::ZERO; 3]);
        assert_eq!(
            verifier.verify(&leaf(0), &proof, &Node::ZERO),
            Err(MerkleError::IndexOutOfRange { index: 8, bound: 8 })
        );
    }

    #[test]
    fn test_verify_rejects_unsupported_depth() {
        let proof = MerkleProof::new(1, vec![Node::ZERO; 70]);
        assert_eq!(
            InclusionVerifier::new(70).verify(&Node::ZERO, &proof, &Node::ZERO),
            Err(MerkleError::InvalidDepth { depth: 70, max: crate::MAX_DEPTH })
        );
        assert!(matches!(
            verify_inclusion(&Keccak256Hasher, 0, &Node::ZERO, &MerkleProof::new(0, vec![]), &Node::ZERO),
            Err(MerkleError::InvalidDepth { depth: 0, .. })
        ));
    }

    #[test]
    fn test_compute_root_long_path() {
        // Levels past the index width read as left children
        let h = Keccak256Hasher;
        let proof = MerkleProof::new(u64::MAX, vec![Node::ZERO; 70]);
        let root = proof.compute_root(&h, &Node::repeat_byte(1));
        let expected = (0..70).fold(Node::repeat_byte(1), |current, level| {
            if level < 64 {
                h.combine(&Node::ZERO, &current)
            } else {
                h.combine(&current, &Node::ZERO)
            }
        });
        assert_eq!(root, expected);
    }

    #[test]
    fn test_prove_from_leaves_full_tree() {
        let h = Keccak256Hasher;
        let leaves: Vec<Node> = (0..4).map(leaf).collect();
        let root = h.combine(&h.combine(&leaves[0], &leaves[1]), &h.combine(&leaves[2], &leaves[3]));

        for (i, l) in leaves.iter().enumerate() {
            let proof = prove_from_leaves(&h, 2, &leaves, i as u64).unwrap();
            assert!(verify_inclusion(&h, 2, l, &proof, &root).unwrap());
        }
    }

    #[test]
    fn test_prove_from_leaves_pads_with_zeros() {
        let h = Keccak256Hasher;
        let leaves: Vec<Node> = (0..3).map(leaf).collect();
        let zeros = zero_values(&h, 2);

        let proof = prove_from_leaves(&h, 2, &leaves, 2).unwrap();
        assert_eq!(proof.siblings, vec![zeros[0], h.combine(&leaves[0], &leaves[1])]);
    }

    #[test]
    fn test_prove_from_leaves_errors() {
        let h = Keccak256Hasher;
        let leaves: Vec<Node> = (0..3).map(leaf).collect();

        assert_eq!(
            prove_from_leaves(&h, 2, &leaves, 3),
            Err(MerkleError::IndexOutOfRange { index: 3, bound: 3 })
        );
        assert_eq!(
            prove_from_leaves(&h, 1, &leaves, 0),
            Err(MerkleError::TreeFull { capacity: 2 })
        );
        assert!(matches!(
            prove_from_leaves(&h, 0, &leaves, 0),
            Err(MerkleError::InvalidDepth { depth: 0, .. })
        ));
    }

    #[test]
    fn test_inclusion_proof_json() {
        let proof = InclusionProof::new(
            Node::repeat_byte(0xab),
            MerkleProof::new(5, vec![Node::ZERO, Node::repeat_byte(1)]),
            Node::repeat_byte(0xcd),
        );

        let json = serde_json::to_value(&proof).unwrap();
        assert_eq!(json["index"], 5);
        assert_eq!(json["leaf"], format!("0x{}", "ab".repeat(32)));
        assert_eq!(json["siblings"][1], format!("0x{}", "01".repeat(32)));

        let decoded: InclusionProof = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, proof);
    }
}
