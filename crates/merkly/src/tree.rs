//! Root computation.
//!
//! Levels are reduced pairwise from the leaves up. When a level has an odd number of
//! nodes the last one is promoted to the next level unchanged; it is never duplicated
//! or padded. The proof builder reuses [`next_level`] so both sides agree on the shape
//! of the tree for any leaf count.

use crate::error::{MerkleError, MerkleResult};
use crate::hash::{Combiner, Digest};

/// Reduce a non-empty sequence of digests to its root.
pub fn make_root<C: Combiner + ?Sized>(combiner: &C, leaves: &[Digest]) -> MerkleResult<Digest> {
    match leaves {
        [] => Err(MerkleError::EmptyTree),
        [single] => Ok(single.clone()),
        _ => {
            let mut level = next_level(combiner, leaves);
            while level.len() > 1 {
                level = next_level(combiner, &level);
            }
            // Each reduction strictly shrinks a level of two or more nodes
            level.pop().ok_or(MerkleError::EmptyTree)
        }
    }
}

/// Combine one level into its parent level.
pub fn next_level<C: Combiner + ?Sized>(combiner: &C, level: &[Digest]) -> Vec<Digest> {
    level
        .chunks(2)
        .map(|pair| match pair {
            [left, right] => combiner.combine(left.as_bytes(), right.as_bytes()),
            [promoted] => promoted.clone(),
            _ => unreachable!("chunks(2) yields one or two nodes"),
        })
        .collect()
}

/// Number of levels above the leaves, i.e. `ceil(log2(n))`.
pub fn tree_depth(n_leaves: usize) -> usize {
    if n_leaves <= 1 {
        0
    } else {
        (usize::BITS - (n_leaves - 1).leading_zeros()) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::HashAlgorithm;

    fn concat(x: &[u8], y: &[u8]) -> Vec<u8> {
        [x, y].concat()
    }

    fn text_leaves(items: &str) -> Vec<Digest> {
        items.chars().map(|c| Digest::from(c.to_string().as_str())).collect()
    }

    #[test]
    fn test_empty_tree() {
        let result = make_root(&HashAlgorithm::Keccak256, &[]);
        assert_eq!(result, Err(MerkleError::EmptyTree));
    }

    #[test]
    fn test_single_leaf_is_root() {
        let leaves = text_leaves("a");
        assert_eq!(make_root(&concat, &leaves).unwrap(), Digest::from("a"));
    }

    #[test]
    fn test_odd_node_promoted() {
        let leaves = text_leaves("abcde");
        assert_eq!(
            next_level(&concat, &leaves),
            vec![Digest::from("ab"), Digest::from("cd"), Digest::from("e")]
        );
        assert_eq!(make_root(&concat, &leaves).unwrap(), Digest::from("abcde"));
    }

    #[test]
    fn test_promotion_not_duplication() {
        // [ab, c] -> abc, a duplicating tree would give abcc
        let leaves = text_leaves("abc");
        assert_eq!(make_root(&concat, &leaves).unwrap(), Digest::from("abc"));
    }

    #[test]
    fn test_order_matters() {
        let keccak = HashAlgorithm::Keccak256;
        let forward: Vec<Digest> = ["a", "b", "c"].iter().map(|l| keccak.hash_leaf(l.as_bytes())).collect();
        let mut reversed = forward.clone();
        reversed.reverse();
        assert_ne!(
            make_root(&keccak, &forward).unwrap(),
            make_root(&keccak, &reversed).unwrap()
        );
    }

    #[test]
    fn test_tree_depth() {
        assert_eq!(tree_depth(0), 0);
        assert_eq!(tree_depth(1), 0);
        assert_eq!(tree_depth(2), 1);
        assert_eq!(tree_depth(3), 2);
        assert_eq!(tree_depth(4), 2);
        assert_eq!(tree_depth(5), 3);
        assert_eq!(tree_depth(1024), 10);
        assert_eq!(tree_depth(1025), 11);
    }
}
