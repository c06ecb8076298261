//! Incremental Merkle tree implementation

use tracing::{debug, info};

use crate::{
    config::TreeConfig,
    error::{MerkleError, Result},
    hasher::{Keccak256Hasher, NodeHasher},
    proof::{InclusionProof, InclusionVerifier, MerkleProof},
    Node, MAX_DEPTH,
};

/// Insertion state of a tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeState {
    /// Fewer than `2^depth` leaves, inserts are accepted
    Active,
    /// All `2^depth` leaves are taken, inserts fail with `TreeFull`
    Full,
}

/// Number of leaves a tree of `depth` levels holds
pub(crate) fn capacity_for(depth: usize) -> u64 {
    u32::try_from(depth).ok().and_then(|shift| 1u64.checked_shl(shift)).unwrap_or(u64::MAX)
}

pub(crate) const fn check_depth(depth: usize) -> Result<()> {
    if depth == 0 || depth > MAX_DEPTH {
        return Err(MerkleError::InvalidDepth { depth, max: MAX_DEPTH });
    }
    Ok(())
}

/// Roots of empty subtrees for levels `0..=depth`
pub(crate) fn zero_values<H: NodeHasher>(hasher: &H, depth: usize) -> Vec<Node> {
    let mut zeros = Vec::with_capacity(depth + 1);
    let mut current = Node::ZERO;
    zeros.push(current);
    for _ in 0..depth {
        current = hasher.combine(&current, &current);
        zeros.push(current);
    }
    zeros
}

/// Fixed-depth, append-only Merkle tree.
///
/// The root is maintained from one "filled subtree" per level: the last left
/// node seen at that level. Inserting costs `depth` hashes. Every node computed
/// along the insertion paths is also kept per level, so inclusion proofs for
/// any inserted leaf are served in O(depth) without rehashing.
#[derive(Clone, Debug)]
pub struct IncrementalMerkleTree<H = Keccak256Hasher> {
    depth: usize,
    hasher: H,
    /// `zeros[l]` is the root of an empty subtree of height `l`
    zeros: Vec<Node>,
    /// Last left node per level, `depth` entries
    filled_subtrees: Vec<Node>,
    /// All nodes computed so far per level; the last entry of a level may
    /// still be zero padded
    nodes: Vec<Vec<Node>>,
    root: Node,
    next_index: u64,
}

impl IncrementalMerkleTree<Keccak256Hasher> {
    /// Create an empty Keccak256 tree
    pub fn new(depth: usize) -> Result<Self> {
        Self::with_hasher(depth, Keccak256Hasher)
    }

    /// Create an empty Keccak256 tree from configuration
    pub fn from_config(config: &TreeConfig) -> Result<Self> {
        Self::new(config.depth)
    }
}

impl<H: NodeHasher> IncrementalMerkleTree<H> {
    /// Create an empty tree using a custom hasher
    pub fn with_hasher(depth: usize, hasher: H) -> Result<Self> {
        check_depth(depth)?;

        let zeros = zero_values(&hasher, depth);
        let root = zeros[depth];
        debug!(target: "imt", depth, %root, "Created empty tree");

        Ok(Self {
            depth,
            filled_subtrees: zeros[..depth].to_vec(),
            nodes: vec![Vec::new(); depth],
            zeros,
            hasher,
            root,
            next_index: 0,
        })
    }

    /// Tree depth
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Number of inserted leaves, which is also the next leaf index
    pub const fn len(&self) -> u64 {
        self.next_index
    }

    /// Whether no leaf has been inserted yet
    pub const fn is_empty(&self) -> bool {
        self.next_index == 0
    }

    /// Maximum number of leaves, `2^depth`
    pub fn capacity(&self) -> u64 {
        capacity_for(self.depth)
    }

    /// Whether every leaf slot is taken
    pub fn is_full(&self) -> bool {
        self.next_index >= self.capacity()
    }

    /// Current insertion state
    pub fn state(&self) -> TreeState {
        if self.is_full() {
            TreeState::Full
        } else {
            TreeState::Active
        }
    }

    /// Get the root hash
    pub const fn root(&self) -> Node {
        self.root
    }

    /// Empty subtree root at `level`, if `level <= depth`
    pub fn zero(&self, level: usize) -> Option<Node> {
        self.zeros.get(level).copied()
    }

    /// Empty subtree roots for levels `0..=depth`
    pub fn zeros(&self) -> &[Node] {
        &self.zeros
    }

    /// Current filled subtree per level
    pub fn filled_subtrees(&self) -> &[Node] {
        &self.filled_subtrees
    }

    /// Leaf at `index`, if inserted
    pub fn leaf(&self, index: u64) -> Option<Node> {
        usize::try_from(index).ok().and_then(|i| self.nodes[0].get(i)).copied()
    }

    /// All inserted leaves in index order
    pub fn leaves(&self) -> &[Node] {
        &self.nodes[0]
    }

    /// Hasher used for nodes
    pub const fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Verifier matching this tree's depth and hasher
    pub fn verifier(&self) -> InclusionVerifier<&H> {
        InclusionVerifier::with_hasher(self.depth, &self.hasher)
    }

    /// Append a leaf and return the new root
    pub fn insert(&mut self, leaf: Node) -> Result<Node> {
        self.append(leaf, None)
    }

    /// Append a leaf and return its proof against the new root.
    ///
    /// The proof is collected on the way up: the zero value where the new
    /// node is a left child, the filled subtree where it is a right child.
    pub fn insert_with_proof(&mut self, leaf: Node) -> Result<MerkleProof> {
        let index = self.next_index;
        let mut siblings = Vec::with_capacity(self.depth);
        self.append(leaf, Some(&mut siblings))?;
        Ok(MerkleProof::new(index, siblings))
    }

    /// Append leaves in order and return the final root.
    ///
    /// Nothing is inserted if the batch does not fit.
    pub fn insert_batch(&mut self, leaves: &[Node]) -> Result<Node> {
        let capacity = self.capacity();
        if leaves.len() as u64 > capacity - self.next_index {
            return Err(MerkleError::TreeFull { capacity });
        }
        for leaf in leaves {
            self.append(*leaf, None)?;
        }
        Ok(self.root)
    }

    fn append(&mut self, leaf: Node, mut path: Option<&mut Vec<Node>>) -> Result<Node> {
        let capacity = self.capacity();
        if self.next_index >= capacity {
            return Err(MerkleError::TreeFull { capacity });
        }

        let mut current_hash = leaf;
        let mut current_index = self.next_index;

        for level in 0..self.depth {
            self.record_node(level, current_index, current_hash);

            let sibling = if current_index % 2 == 0 {
                self.filled_subtrees[level] = current_hash;
                let zero = self.zeros[level];
                current_hash = self.hasher.combine(&current_hash, &zero);
                zero
            } else {
                let left = self.filled_subtrees[level];
                current_hash = self.hasher.combine(&left, &current_hash);
                left
            };
            if let Some(path) = path.as_deref_mut() {
                path.push(sibling);
            }

            current_index /= 2;
        }

        self.root = current_hash;
        self.next_index += 1;
        debug!(target: "imt", index = self.next_index - 1, root = %self.root, "Inserted leaf");

        if self.next_index == capacity {
            info!(target: "imt", depth = self.depth, capacity, "Tree is full");
        }

        Ok(self.root)
    }

    /// Store the node at `position` of `level`, replacing the zero padded
    /// value left by an earlier insert into the same subtree.
    fn record_node(&mut self, level: usize, position: u64, node: Node) {
        let nodes = &mut self.nodes[level];
        match usize::try_from(position) {
            Ok(position) if position < nodes.len() => nodes[position] = node,
            _ => nodes.push(node),
        }
    }

    /// Generate a proof for the leaf at `index`.
    ///
    /// Siblings right of the inserted range are zero values, matching how
    /// `insert` hashes absent right children.
    pub fn prove_inclusion(&self, index: u64) -> Result<MerkleProof> {
        if index >= self.next_index {
            return Err(MerkleError::IndexOutOfRange { index, bound: self.next_index });
        }

        let siblings = (0..self.depth)
            .map(|level| {
                let position = (index >> level) ^ 1;
                usize::try_from(position)
                    .ok()
                    .and_then(|p| self.nodes[level].get(p))
                    .copied()
                    .unwrap_or(self.zeros[level])
            })
            .collect();

        Ok(MerkleProof::new(index, siblings))
    }

    /// Generate the portable proof for the leaf at `index` against the
    /// current root
    pub fn inclusion_proof(&self, index: u64) -> Result<InclusionProof> {
        let proof = self.prove_inclusion(index)?;
        let leaf = self
            .leaf(index)
            .ok_or(MerkleError::IndexOutOfRange { index, bound: self.next_index })?;
        Ok(InclusionProof::new(leaf, proof, self.root))
    }

    /// Verify a proof with this tree's depth and hasher.
    ///
    /// Does not consult the inserted leaves; any root may be supplied.
    pub fn verify_inclusion(
        &self,
        leaf: &Node,
        proof: &MerkleProof,
        expected_root: &Node,
    ) -> Result<bool> {
        self.verifier().verify(leaf, proof, expected_root)
    }
}
