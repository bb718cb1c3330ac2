//! # merkly
//!
//! Binary Merkle trees over a pluggable two-argument hash.
//!
//! The crate computes a root over an ordered list of leaves, builds an inclusion proof
//! (audit path) for any leaf, and verifies such a proof against a known root.
//!
//! - [`hash`]: the [`Combiner`] seam, built-in [`HashAlgorithm`]s and the [`Digest`] type
//! - [`tree`]: root computation with odd-node promotion
//! - [`proof`]: [`Proof`] and the two proof builders
//! - [`verify`]: proof folding, usable without the tree
//! - [`mtree`]: the [`MerkleTree`] facade tying the above together
//!
//! ## Odd leaf counts
//!
//! When a level has an odd number of nodes, the last node is carried up unchanged. It is
//! never hashed with itself or with padding. Root and proof construction share this rule.
//!
//! ## Example
//!
//! ```
//! use merkly::MerkleTree;
//!
//! let tree = MerkleTree::new(&["a", "b", "c", "d"]).unwrap();
//! assert_eq!(
//!     tree.root_hex(),
//!     "68203f90e9d07dc5859259d7536e87a6ba9d345f2552b5b9de2999ddce9ce1bf"
//! );
//!
//! let proof = tree.proof("a").unwrap();
//! assert_eq!(proof.len(), 2);
//! assert!(tree.verify(&proof, "a"));
//! ```

pub mod config;
pub mod error;
pub mod hash;
pub mod mtree;
pub mod proof;
pub mod tree;
pub mod verify;

pub use config::{TreeConfig, TreeLayout};
pub use error::{MerkleError, MerkleResult};
pub use hash::{validate_combiner, Combiner, Digest, HashAlgorithm};
pub use mtree::MerkleTree;
pub use proof::{Proof, ProofStep, Side};

/// Digest width of the built-in binary hashes (32 bytes = 256 bits)
pub const HASH_LENGTH: usize = 32;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_general_tree_basic() {
        let leaves: Vec<Vec<u8>> = (0..5).map(|i| format!("leaf{}", i).into_bytes()).collect();

        let tree = MerkleTree::new(&leaves).unwrap();

        // Verify all proofs
        for leaf in &leaves {
            let proof = tree.proof(leaf).unwrap();
            assert!(tree.verify(&proof, leaf));
        }
    }

    #[test]
    fn test_custom_combiner_basic() {
        let leaves = ["a", "b", "c", "d", "e"];
        let tree = MerkleTree::with_combiner(&leaves, |x: &[u8], y: &[u8]| [x, y].concat()).unwrap();

        assert_eq!(tree.root(), &Digest::from("abcde"));
        assert_eq!(
            tree.proof("e").unwrap().into_steps(),
            vec![ProofStep::new(Digest::from("abcd"), Side::Left)]
        );
    }
}
