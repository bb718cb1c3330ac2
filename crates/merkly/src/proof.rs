//! Inclusion proofs (audit paths).
//!
//! A proof is the list of sibling digests met on the way from a leaf to the root,
//! ordered leaf-to-root. Each step records which side the sibling sits on relative to
//! the running accumulator, so folding never needs the leaf index.
//!
//! Two builders are provided:
//!
//! - [`make_proof`]: bottom-up over whole levels, any leaf count. This is the one used
//!   by [`MerkleTree`](crate::MerkleTree) for the general layout.
//! - [`make_proof_power_of_two`]: halves the leaf range until the target is isolated,
//!   recording the root of the other half at each split. Only defined for power-of-two
//!   leaf counts, where it yields exactly the same proof as [`make_proof`].

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use tracing::trace;

use crate::error::{MerkleError, MerkleResult};
use crate::hash::{Combiner, Digest};
use crate::tree::{make_root, next_level, tree_depth};
use crate::verify;

/// Upper bound on an encoded proof: 64 levels with siblings up to 1 KiB each.
pub const MAX_PROOF_BYTES: usize = 1 << 17;

/// Wire configuration for proofs. The limit rejects hostile length prefixes before
/// anything is allocated for them.
fn wire_config() -> impl bincode::config::Config {
    bincode::config::standard().with_limit::<MAX_PROOF_BYTES>()
}

/// Which operand position the sibling takes when folded with the accumulator.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// `combine(sibling, accumulator)`
    Left,
    /// `combine(accumulator, sibling)`
    Right,
}

impl Side {
    /// The side of the other child of the same parent
    pub fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => f.write_str("left"),
            Side::Right => f.write_str("right"),
        }
    }
}

/// One sibling on the audit path.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct ProofStep {
    pub sibling: Digest,
    pub side: Side,
}

impl ProofStep {
    pub fn new(sibling: Digest, side: Side) -> Self {
        Self { sibling, side }
    }

    pub fn left(sibling: Digest) -> Self {
        Self::new(sibling, Side::Left)
    }

    pub fn right(sibling: Digest) -> Self {
        Self::new(sibling, Side::Right)
    }
}

/// An inclusion proof, ordered from the leaf's sibling up to the child of the root.
#[derive(
    Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
#[serde(transparent)]
pub struct Proof {
    steps: Vec<ProofStep>,
}

impl Proof {
    /// Create a new proof from steps in leaf-to-root order
    pub fn new(steps: Vec<ProofStep>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[ProofStep] {
        &self.steps
    }

    pub fn into_steps(self) -> Vec<ProofStep> {
        self.steps
    }

    /// Number of combine operations needed to reach the root
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProofStep> {
        self.steps.iter()
    }

    /// Fold an already hashed leaf through the proof.
    pub fn compute_root<C: Combiner + ?Sized>(&self, combiner: &C, leaf: &Digest) -> Digest {
        verify::fold(combiner, leaf, self)
    }

    /// Check a raw leaf against `root`. A mismatch is `false`, never an error.
    pub fn verify<C: Combiner + ?Sized>(&self, combiner: &C, raw_leaf: &[u8], root: &Digest) -> bool {
        verify::verify_leaf(combiner, self, raw_leaf, root)
    }

    /// Compact binary encoding.
    pub fn to_bytes(&self) -> MerkleResult<Vec<u8>> {
        bincode::encode_to_vec(self, wire_config())
            .map_err(|e| MerkleError::Serialization(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> MerkleResult<Self> {
        let (proof, read): (Proof, usize) =
            bincode::decode_from_slice(bytes, wire_config())
                .map_err(|e| MerkleError::Serialization(e.to_string()))?;
        if read != bytes.len() {
            return Err(MerkleError::Serialization(format!(
                "{} trailing bytes after proof",
                bytes.len() - read
            )));
        }
        Ok(proof)
    }
}

impl From<Vec<ProofStep>> for Proof {
    fn from(steps: Vec<ProofStep>) -> Self {
        Self::new(steps)
    }
}

impl FromIterator<ProofStep> for Proof {
    fn from_iter<I: IntoIterator<Item = ProofStep>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl IntoIterator for Proof {
    type Item = ProofStep;
    type IntoIter = std::vec::IntoIter<ProofStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.into_iter()
    }
}

impl<'a> IntoIterator for &'a Proof {
    type Item = &'a ProofStep;
    type IntoIter = std::slice::Iter<'a, ProofStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

/// Position of the first occurrence of `leaf`.
fn find_leaf(leaves: &[Digest], leaf: &Digest) -> MerkleResult<usize> {
    leaves
        .iter()
        .position(|candidate| candidate == leaf)
        .ok_or_else(|| MerkleError::LeafNotFound {
            leaf: leaf.clone(),
            leaves: leaves.to_vec(),
        })
}

/// Build the audit path for `leaf` over any non-empty leaf sequence.
///
/// Walks the tree bottom-up one level at a time: an odd index takes its left
/// neighbour, an even index takes its right neighbour, and an even index at the end of
/// an odd-length level is promoted without contributing a step.
pub fn make_proof<C: Combiner + ?Sized>(
    combiner: &C,
    leaves: &[Digest],
    leaf: &Digest,
) -> MerkleResult<Proof> {
    if leaves.is_empty() {
        return Err(MerkleError::EmptyTree);
    }
    let mut index = find_leaf(leaves, leaf)?;
    let mut steps = Vec::with_capacity(tree_depth(leaves.len()));
    let mut level = Cow::Borrowed(leaves);

    while level.len() > 1 {
        let step = if index % 2 == 1 {
            Some(ProofStep::left(level[index - 1].clone()))
        } else if index + 1 < level.len() {
            Some(ProofStep::right(level[index + 1].clone()))
        } else {
            None
        };
        trace!(
            level_len = level.len(),
            index,
            side = ?step.as_ref().map(|s| s.side),
            "Proof level"
        );
        steps.extend(step);

        level = Cow::Owned(next_level(combiner, &level));
        index /= 2;
    }

    Ok(Proof::new(steps))
}

/// Build the audit path by repeatedly halving a power-of-two leaf range.
///
/// The root of the half not containing the target becomes a step; the search then
/// continues in the other half. Steps are collected root-to-leaf and reversed.
pub fn make_proof_power_of_two<C: Combiner + ?Sized>(
    combiner: &C,
    leaves: &[Digest],
    leaf: &Digest,
) -> MerkleResult<Proof> {
    if !leaves.len().is_power_of_two() {
        return Err(MerkleError::InvalidLeafSetSize { len: leaves.len() });
    }
    let mut index = find_leaf(leaves, leaf)?;
    let mut steps = Vec::with_capacity(tree_depth(leaves.len()));
    let mut range = leaves;

    while range.len() > 1 {
        let half = range.len() / 2;
        let (left, right) = range.split_at(half);
        if index < half {
            steps.push(ProofStep::right(make_root(combiner, right)?));
            range = left;
        } else {
            steps.push(ProofStep::left(make_root(combiner, left)?));
            range = right;
            index -= half;
        }
    }

    steps.reverse();
    Ok(Proof::new(steps))
}
