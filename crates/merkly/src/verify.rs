//! Proof verification.
//!
//! Verification only needs the combiner, the proof and the expected root. It never
//! touches the leaf set, so a verifier can run without holding the tree.

use crate::error::MerkleResult;
use crate::hash::{Combiner, Digest};
use crate::proof::{Proof, Side};

/// Fold a leaf digest through every step of `proof`, in order.
pub fn fold<C: Combiner + ?Sized>(combiner: &C, leaf: &Digest, proof: &Proof) -> Digest {
    proof.iter().fold(leaf.clone(), |acc, step| match step.side {
        Side::Right => combiner.combine(acc.as_bytes(), step.sibling.as_bytes()),
        Side::Left => combiner.combine(step.sibling.as_bytes(), acc.as_bytes()),
    })
}

/// Verify a leaf that was hashed upstream.
pub fn verify_digest<C: Combiner + ?Sized>(
    combiner: &C,
    proof: &Proof,
    leaf: &Digest,
    expected_root: &Digest,
) -> bool {
    fold(combiner, leaf, proof) == *expected_root
}

/// Hash `raw_leaf` with the combiner's leaf rule, then verify it.
pub fn verify_leaf<C: Combiner + ?Sized>(
    combiner: &C,
    proof: &Proof,
    raw_leaf: &[u8],
    expected_root: &Digest,
) -> bool {
    verify_digest(combiner, proof, &combiner.hash_leaf(raw_leaf), expected_root)
}

/// Verify against a root given as hex (optionally `0x` prefixed).
///
/// Only a malformed root is an error; a proof that does not reproduce the root is
/// `Ok(false)`.
pub fn verify_against_hex<C: Combiner + ?Sized>(
    combiner: &C,
    proof: &Proof,
    raw_leaf: &[u8],
    expected_root_hex: &str,
) -> MerkleResult<bool> {
    let expected_root = Digest::from_hex(expected_root_hex)?;
    Ok(verify_leaf(combiner, proof, raw_leaf, &expected_root))
}
