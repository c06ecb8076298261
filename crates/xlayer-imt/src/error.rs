//! Error types for tree and proof operations

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, MerkleError>;

/// Errors returned by hashing, insertion, proof generation and verification.
///
/// Every variant is a deterministic logical error. A call that returns one of
/// these leaves the tree exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MerkleError {
    /// Hash inputs must be exactly 32 bytes each
    #[error("invalid hash input length: left {left} bytes, right {right} bytes (expected 32 each)")]
    InvalidInputLength {
        /// Length of the left input
        left: usize,
        /// Length of the right input
        right: usize,
    },

    /// The tree already holds `2^depth` leaves
    #[error("tree is full: capacity {capacity} leaves")]
    TreeFull {
        /// Number of leaves the tree can hold
        capacity: u64,
    },

    /// Leaf index outside the valid range
    #[error("leaf index {index} out of range (must be < {bound})")]
    IndexOutOfRange {
        /// Requested index
        index: u64,
        /// Exclusive upper bound that applied to this request
        bound: u64,
    },

    /// Proof does not carry one sibling per level
    #[error("malformed proof: expected {expected} siblings, got {actual}")]
    MalformedProof {
        /// Tree depth
        expected: usize,
        /// Number of siblings in the proof
        actual: usize,
    },

    /// Tree depth outside the supported range
    #[error("invalid tree depth {depth} (must be between 1 and {max})")]
    InvalidDepth {
        /// Requested depth
        depth: usize,
        /// Largest supported depth
        max: usize,
    },
}
