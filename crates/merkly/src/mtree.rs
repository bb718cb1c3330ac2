//! The [`MerkleTree`] facade: hash the leaves once, keep the root, answer proofs.

use tracing::debug;

use crate::config::{TreeConfig, TreeLayout};
use crate::error::MerkleResult;
use crate::hash::{validate_combiner, Combiner, Digest, HashAlgorithm};
use crate::proof::{make_proof, make_proof_power_of_two, Proof};
use crate::tree::make_root;
use crate::verify;

/// An immutable binary Merkle tree over an ordered leaf sequence.
///
/// Leaves are hashed with the combiner's leaf rule at construction and the root is
/// computed eagerly. Every query afterwards is a pure function of that state, so a
/// tree can be shared between threads as long as its combiner can.
#[derive(Clone, Debug)]
pub struct MerkleTree<C = HashAlgorithm> {
    /// Leaf digests in insertion order, never empty
    leaves: Vec<Digest>,
    root: Digest,
    combiner: C,
    layout: TreeLayout,
}

impl MerkleTree<HashAlgorithm> {
    /// Build a Keccak-256 tree with the general layout.
    pub fn new<T: AsRef<[u8]>>(leaves: &[T]) -> MerkleResult<Self> {
        Self::with_combiner(leaves, HashAlgorithm::default())
    }

    /// Build a tree whose combiner and layout both come from `config`.
    pub fn from_config<T: AsRef<[u8]>>(leaves: &[T], config: &TreeConfig) -> MerkleResult<Self> {
        Self::with_layout(leaves, config.hash, config.layout)
    }
}

impl<C: Combiner> MerkleTree<C> {
    /// Build a tree with a caller-supplied combiner and the general layout.
    pub fn with_combiner<T: AsRef<[u8]>>(leaves: &[T], combiner: C) -> MerkleResult<Self> {
        Self::with_layout(leaves, combiner, TreeLayout::General)
    }

    /// Build a tree with a caller-supplied combiner and layout.
    pub fn with_layout<T: AsRef<[u8]>>(
        leaves: &[T],
        combiner: C,
        layout: TreeLayout,
    ) -> MerkleResult<Self> {
        validate_combiner(&combiner)?;
        let digests = leaves
            .iter()
            .map(|leaf| combiner.hash_leaf(leaf.as_ref()))
            .collect();
        Self::build(digests, combiner, layout)
    }

    /// Build a tree from leaves that were already hashed upstream.
    pub fn from_digests(leaves: Vec<Digest>, combiner: C, layout: TreeLayout) -> MerkleResult<Self> {
        validate_combiner(&combiner)?;
        Self::build(leaves, combiner, layout)
    }

    fn build(leaves: Vec<Digest>, combiner: C, layout: TreeLayout) -> MerkleResult<Self> {
        layout.check_leaf_count(leaves.len())?;
        let root = make_root(&combiner, &leaves)?;

        debug!(
            leaves = leaves.len(),
            layout = %layout,
            combiner = combiner.name(),
            root = %root,
            "Built merkle tree"
        );

        Ok(Self {
            leaves,
            root,
            combiner,
            layout,
        })
    }

    /// Get the root hash of the tree.
    pub fn root(&self) -> &Digest {
        &self.root
    }

    /// Root as lowercase hex.
    pub fn root_hex(&self) -> String {
        self.root.to_hex()
    }

    pub fn leaves(&self) -> &[Digest] {
        &self.leaves
    }

    /// Get the number of leaves in the tree.
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    /// Always false for a constructed tree.
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn layout(&self) -> TreeLayout {
        self.layout
    }

    pub fn combiner(&self) -> &C {
        &self.combiner
    }

    /// Audit path for a raw leaf.
    pub fn proof<L: AsRef<[u8]>>(&self, raw_leaf: L) -> MerkleResult<Proof> {
        self.proof_for_digest(&self.combiner.hash_leaf(raw_leaf.as_ref()))
    }

    /// Audit path for an already hashed leaf.
    pub fn proof_for_digest(&self, leaf: &Digest) -> MerkleResult<Proof> {
        match self.layout {
            TreeLayout::General => make_proof(&self.combiner, &self.leaves, leaf),
            TreeLayout::PowerOfTwo => make_proof_power_of_two(&self.combiner, &self.leaves, leaf),
        }
    }

    /// Check a raw leaf against this tree's root.
    pub fn verify<L: AsRef<[u8]>>(&self, proof: &Proof, raw_leaf: L) -> bool {
        verify::verify_leaf(&self.combiner, proof, raw_leaf.as_ref(), &self.root)
    }

    /// Check an already hashed leaf against this tree's root.
    pub fn verify_digest(&self, proof: &Proof, leaf: &Digest) -> bool {
        verify::verify_digest(&self.combiner, proof, leaf, &self.root)
    }

    /// Verify without a tree, against a root published as hex.
    pub fn verify_against<L: AsRef<[u8]>>(
        combiner: &C,
        proof: &Proof,
        raw_leaf: L,
        expected_root_hex: &str,
    ) -> MerkleResult<bool> {
        verify::verify_against_hex(combiner, proof, raw_leaf.as_ref(), expected_root_hex)
    }
}
