//! Incremental Merkle Tree (IMT) implementation for xlayer
//!
//! This crate provides a fixed-depth, append-only Merkle tree over Keccak256
//! nodes, the structure behind on-chain commitment trees.
//! Key features:
//! - Filled subtrees: O(depth) insert and O(1) root without storing the tree
//! - Per-level node cache: O(depth) inclusion proofs for any inserted leaf
//! - EVM compatible: `parent = keccak256(left || right)`, zero leaves are
//!   32 zero bytes
//! - Pluggable hasher through [`NodeHasher`]
//!
//! ```
//! use xlayer_imt::{IncrementalMerkleTree, Keccak256Hasher};
//!
//! let mut tree = IncrementalMerkleTree::new(10)?;
//! let leaf = Keccak256Hasher::hash(b"payload");
//! let root = tree.insert(leaf)?;
//!
//! let proof = tree.prove_inclusion(0)?;
//! assert!(tree.verify_inclusion(&leaf, &proof, &root)?);
//! # Ok::<(), xlayer_imt::MerkleError>(())
//! ```

mod config;
mod error;
mod hasher;
mod proof;
mod shared;
mod tree;

pub use config::TreeConfig;
pub use error::{MerkleError, Result};
pub use hasher::{Keccak256Hasher, NodeHasher};
pub use proof::{prove_from_leaves, verify_inclusion, InclusionProof, InclusionVerifier, MerkleProof};
pub use shared::SharedTree;
pub use tree::{IncrementalMerkleTree, TreeState};

/// 32-byte tree node
pub type Node = alloy_primitives::B256;

/// Default tree depth (1024 leaves)
pub const DEFAULT_DEPTH: usize = 10;

/// Largest supported tree depth
pub const MAX_DEPTH: usize = 32;
