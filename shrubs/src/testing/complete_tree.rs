//! A reference Merkle tree that recomputes every value from the complete list of leaves.
use std::cmp::min;

use crate::{Hashable, Level, Position};

/// Computes the root of a tree of the given depth whose leftmost leaves are `leaves` and whose
/// remaining leaves are empty.
pub fn root<H: Hashable + Clone>(leaves: &[H], depth: u8) -> H {
    if leaves.is_empty() {
        return H::empty_root(Level::from(depth));
    }
    if depth == 0 {
        return leaves[0].clone();
    }

    let half = 1u64 << (depth - 1);
    let split = min(half, leaves.len() as u64) as usize;
    let (left, right) = leaves.split_at(split);
    H::combine(
        Level::from(depth - 1),
        &root(left, depth - 1),
        &root(right, depth - 1),
    )
}

/// Computes the siblings of the leaf at `position` from the leaf level upward, in a tree of the
/// given depth containing `leaves`.
pub fn witness<H: Hashable + Clone>(leaves: &[H], position: Position, depth: u8) -> Vec<H> {
    let len = leaves.len() as u64;
    let mut path = vec![];
    for bit in 0..depth {
        let sibling = (u64::from(position) >> bit) ^ 1;
        let start = sibling << bit;
        path.push(if start < len {
            let end = min(start.saturating_add(1 << bit), len);
            root(&leaves[start as usize..end as usize], bit)
        } else {
            H::empty_root(Level::from(bit))
        });
    }
    path
}
