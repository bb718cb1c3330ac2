//! Error types for merkle tree operations.

use thiserror::Error;

use crate::hash::Digest;

/// Result type for merkle operations
pub type MerkleResult<T> = Result<T, MerkleError>;

/// Errors that can occur during merkle tree operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MerkleError {
    /// Power-of-two layout given a leaf count that is not a positive power of two
    #[error("Size of leaves should be a power of 2, got {len}")]
    InvalidLeafSetSize { len: usize },

    /// Empty tree error
    #[error("Cannot get root of an empty tree")]
    EmptyTree,

    /// Proof requested for a leaf that is not part of the tree
    #[error("Leaf {leaf} does not exist in the tree: [{}]", join_digests(.leaves))]
    LeafNotFound { leaf: Digest, leaves: Vec<Digest> },

    /// The combiner failed its construction-time probe
    #[error("Invalid hash function: {0}")]
    InvalidHashFunction(String),

    /// Malformed hex at a textual boundary
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    /// Unknown layout or hash name in configuration
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

fn join_digests(digests: &[Digest]) -> String {
    digests
        .iter()
        .map(Digest::to_hex)
        .collect::<Vec<_>>()
        .join(", ")
}
