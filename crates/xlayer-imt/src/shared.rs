//! Thread-safe handle for a single writer and many readers

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{
    error::Result,
    hasher::{Keccak256Hasher, NodeHasher},
    proof::{InclusionProof, MerkleProof},
    tree::IncrementalMerkleTree,
    Node,
};

/// Shared tree handle.
///
/// Inserts take the write lock, so leaf indices follow the order in which
/// writers acquire it. Reads and proofs take the read lock and observe one
/// consistent `(leaves, len, root)` snapshot.
#[derive(Debug)]
pub struct SharedTree<H = Keccak256Hasher> {
    inner: Arc<RwLock<IncrementalMerkleTree<H>>>,
}

impl<H> Clone for SharedTree<H> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<H: NodeHasher> From<IncrementalMerkleTree<H>> for SharedTree<H> {
    fn from(tree: IncrementalMerkleTree<H>) -> Self {
        Self::new(tree)
    }
}

impl<H: NodeHasher> SharedTree<H> {
    /// Wrap a tree
    pub fn new(tree: IncrementalMerkleTree<H>) -> Self {
        Self { inner: Arc::new(RwLock::new(tree)) }
    }

    // Tree state is only written after every check in `insert` has passed, so
    // a poisoned lock still guards a consistent tree.
    fn read(&self) -> RwLockReadGuard<'_, IncrementalMerkleTree<H>> {
        self.inner.read().unwrap_or_else(|e| {
            tracing::warn!(target: "imt", "Recovered poisoned tree lock for reading");
            PoisonError::into_inner(e)
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, IncrementalMerkleTree<H>> {
        self.inner.write().unwrap_or_else(|e| {
            tracing::warn!(target: "imt", "Recovered poisoned tree lock for writing");
            PoisonError::into_inner(e)
        })
    }

    /// Append a leaf and return the new root
    pub fn insert(&self, leaf: Node) -> Result<Node> {
        self.write().insert(leaf)
    }

    /// Append a leaf and return its proof against the new root
    pub fn insert_with_proof(&self, leaf: Node) -> Result<MerkleProof> {
        self.write().insert_with_proof(leaf)
    }

    /// Append leaves under a single lock acquisition
    pub fn insert_batch(&self, leaves: &[Node]) -> Result<Node> {
        self.write().insert_batch(leaves)
    }

    /// Current root
    pub fn root(&self) -> Node {
        self.read().root()
    }

    /// Number of inserted leaves
    pub fn len(&self) -> u64 {
        self.read().len()
    }

    /// Whether no leaf has been inserted yet
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Proof for the leaf at `index` against the current root
    pub fn prove_inclusion(&self, index: u64) -> Result<MerkleProof> {
        self.read().prove_inclusion(index)
    }

    /// Portable proof for the leaf at `index`, taken under one read lock
    pub fn inclusion_proof(&self, index: u64) -> Result<InclusionProof> {
        self.read().inclusion_proof(index)
    }

    /// Verify a proof with the tree's depth and hasher
    pub fn verify_inclusion(
        &self,
        leaf: &Node,
        proof: &MerkleProof,
        expected_root: &Node,
    ) -> Result<bool> {
        self.read().verify_inclusion(leaf, proof, expected_root)
    }
}

impl<H: NodeHasher + Clone> SharedTree<H> {
    /// Clone the current tree
    pub fn snapshot(&self) -> IncrementalMerkleTree<H> {
        self.read().clone()
    }
}
