// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! Binary Merkle tree commitment over ordered hash lists.

use crate::hash::Hash;
use crate::settings::HASH_SIZE_BYTES;

/// Compute the Merkle root of an ordered list of hashes.
///
/// The tree is built level by level: each parent is the hash of the
/// concatenated bytes of its two children, and a level with an odd number of
/// nodes pairs its last node with itself. An empty list commits to the hash
/// of the empty byte string. The result is deterministic and sensitive to
/// the order of the leaves.
///
/// # Example
/// ```
/// # use galena_hash::{merkle_root, Hash};
/// let leaves = vec![
///     Hash::compute_from(b"a"),
///     Hash::compute_from(b"b"),
/// ];
/// assert_eq!(merkle_root(&leaves), merkle_root(&leaves));
/// ```
pub fn merkle_root(hashes: &[Hash]) -> Hash {
    if hashes.is_empty() {
        return Hash::compute_from(&[]);
    }
    let mut level: Vec<Hash> = hashes.to_vec();
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| {
                let left = &pair[0];
                let right = pair.get(1).unwrap_or(left);
                let mut concat = [0u8; HASH_SIZE_BYTES * 2];
                concat[..HASH_SIZE_BYTES].copy_from_slice(left.to_bytes());
                concat[HASH_SIZE_BYTES..].copy_from_slice(right.to_bytes());
                Hash::compute_from(&concat)
            })
            .collect();
    }
    level[0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn leaves(n: usize) -> Vec<Hash> {
        (0..n)
            .map(|i| Hash::compute_from(format!("leaf-{}", i).as_bytes()))
            .collect()
    }

    #[test]
    #[serial]
    fn test_empty_root_is_hash_of_empty_input() {
        assert_eq!(merkle_root(&[]), Hash::compute_from(&[]));
    }

    #[test]
    #[serial]
    fn test_single_leaf_is_its_own_root() {
        let leaf = Hash::compute_from(b"only");
        assert_eq!(merkle_root(&[leaf]), leaf);
    }

    #[test]
    #[serial]
    fn test_deterministic() {
        let hashes = leaves(7);
        assert_eq!(merkle_root(&hashes), merkle_root(&hashes));
    }

    #[test]
    #[serial]
    fn test_order_sensitive() {
        let mut hashes = leaves(4);
        let root = merkle_root(&hashes);
        hashes.swap(0, 3);
        assert_ne!(merkle_root(&hashes), root);
    }

    #[test]
    #[serial]
    fn test_odd_level_duplicates_last_node() {
        let mut hashes = leaves(3);
        let root = merkle_root(&hashes);
        // duplicating the trailing node explicitly must not change the root
        hashes.push(hashes[2]);
        assert_eq!(merkle_root(&hashes), root);
    }

    #[test]
    #[serial]
    fn test_two_leaves_parent_is_concat_hash() {
        let hashes = leaves(2);
        let mut concat = Vec::new();
        concat.extend_from_slice(hashes[0].to_bytes());
        concat.extend_from_slice(hashes[1].to_bytes());
        assert_eq!(merkle_root(&hashes), Hash::compute_from(&concat));
    }
}
