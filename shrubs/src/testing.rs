//! Types and utilities for checking the accumulator against a reference Merkle tree.

use core::fmt::Debug;
use proptest::prelude::*;
use rand_core::RngCore;
use std::collections::BTreeSet;

use crate::{
    error::QueryError, sha256::Sha256Node, store::NodeStore, Accumulator, Address, Hashable,
    Level, Position,
};

pub mod complete_tree;

//
// Types and utilities for shared example tests.
//

/// A [`Hashable`] that can be deterministically derived from an integer, so that shared checks
/// can generate leaves for any hash type.
pub trait TestHashable: Hashable + Clone + PartialEq + Debug {
    fn from_u64(value: u64) -> Self;
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct SipHashable(pub u64);

impl Hashable for SipHashable {
    fn empty_leaf() -> Self {
        SipHashable(0)
    }

    fn combine(_level: Level, a: &Self, b: &Self) -> Self {
        #![allow(deprecated)]
        use std::hash::{Hasher, SipHasher};

        let mut hasher = SipHasher::new();
        hasher.write_u64(a.0);
        hasher.write_u64(b.0);
        SipHashable(hasher.finish())
    }
}

impl TestHashable for SipHashable {
    fn from_u64(value: u64) -> Self {
        SipHashable(value)
    }
}

impl Hashable for String {
    fn empty_leaf() -> Self {
        "_".to_string()
    }

    fn combine(_: Level, a: &Self, b: &Self) -> Self {
        a.to_string() + b
    }
}

impl TestHashable for String {
    fn from_u64(value: u64) -> Self {
        ('a'..)
            .nth(value as usize)
            .expect("we do not choose test value indices larger than the iterable character range")
            .to_string()
    }
}

impl TestHashable for Sha256Node {
    fn from_u64(value: u64) -> Self {
        Sha256Node::digest(&value.to_le_bytes())
    }
}

/// Generates `count` random 32-byte leaves.
pub fn random_leaves<R: RngCore>(rng: &mut R, count: usize) -> Vec<Sha256Node> {
    (0..count)
        .map(|_| {
            let mut bytes = [0u8; 32];
            rng.fill_bytes(&mut bytes);
            Sha256Node(bytes)
        })
        .collect()
}

//
// Operations
//

#[derive(Clone, Debug)]
pub enum Operation<H> {
    Insert(H),
    InsertEmpty,
    NextLeaf,
    Witness(Position),
    Frontier(Position),
}

use Operation::*;

pub fn arb_operation<G: Strategy + Clone>(
    item_gen: G,
    pos_gen: impl Strategy<Value = Position> + Clone,
) -> impl Strategy<Value = Operation<G::Value>>
where
    G::Value: Clone + 'static,
{
    prop_oneof![
        6 => item_gen.prop_map(Operation::Insert),
        1 => Just(Operation::InsertEmpty),
        1 => Just(Operation::NextLeaf),
        2 => pos_gen.clone().prop_map(Operation::Witness),
        2 => pos_gen.prop_map(Operation::Frontier),
    ]
}

/// Applies the given operations to the accumulator, checking every result against a reference
/// tree built from the leaves inserted so far.
pub fn check_operations<H, S, const DEPTH: u8>(
    mut tree: Accumulator<H, S, DEPTH>,
    ops: &[Operation<H>],
) -> Result<(), TestCaseError>
where
    H: Hashable + Clone + PartialEq + Debug,
    S: NodeStore<H = H>,
{
    let mut leaves: Vec<H> = vec![];

    for op in ops {
        match op {
            Insert(_) | InsertEmpty => {
                let value = match op {
                    Insert(value) => value.clone(),
                    _ => H::empty_leaf(),
                };
                match tree.insert(value.clone()) {
                    Ok(inserted) => {
                        prop_assert_eq!(inserted.index(), Position::from(leaves.len() as u64));
                        leaves.push(value);
                        prop_assert_eq!(inserted.root(), &complete_tree::root(&leaves, DEPTH));
                        prop_assert_eq!(
                            inserted.events().iter().filter(|e| e.is_stored()).count(),
                            1
                        );
                        prop_assert_eq!(
                            inserted.events().iter().filter(|e| e.is_consumed()).count(),
                            usize::from(inserted.index().store_level())
                        );
                    }
                    Err(_) => {
                        prop_assert_eq!(
                            leaves.len() as u64,
                            Accumulator::<H, S, DEPTH>::capacity()
                        );
                    }
                }
            }
            NextLeaf => {
                prop_assert_eq!(
                    tree.next_leaf_to_insert(),
                    Position::from(leaves.len() as u64)
                );
            }
            Witness(position) => match tree.witness(*position) {
                Ok(path) => {
                    let i = u64::from(*position) as usize;
                    prop_assert!(tree.is_in_window(*position));
                    let expected_root = complete_tree::root(&leaves[..=i], DEPTH);
                    prop_assert_eq!(&path.root(leaves[i].clone()), &expected_root);
                    prop_assert_eq!(tree.root_at(*position), Some(&expected_root));
                }
                Err(QueryError::NotInserted(_)) => {
                    prop_assert!(u64::from(*position) >= leaves.len() as u64);
                }
                Err(QueryError::Stale { .. }) => {
                    prop_assert!(*position < tree.oldest_retained());
                }
                Err(QueryError::NodeUnavailable(addr)) => {
                    prop_assert!(false, "in-window node {:?} is unavailable", addr);
                }
            },
            Frontier(position) => {
                let frontier = tree.get_frontier_by_index(*position);
                prop_assert_eq!(frontier.len(), usize::from(DEPTH));
                if tree.is_in_window(*position) {
                    prop_assert!(frontier.iter().all(|h| h.is_some()));
                }
            }
        }
    }

    Ok(())
}

//
// Shared example tests
//

/// Returns the addresses of the nodes that the accumulator is expected to retain: the union of
/// the frontier paths of the indices in the window, plus the root of a full tree.
pub fn expected_retained<H: Hashable + Clone, S: NodeStore<H = H>, const DEPTH: u8>(
    tree: &Accumulator<H, S, DEPTH>,
) -> BTreeSet<Address> {
    let mut expected = (u64::from(tree.oldest_retained())..u64::from(tree.next_leaf_to_insert()))
        .flat_map(|i| tree.calculate_path(Position::from(i)))
        .flatten()
        .collect::<BTreeSet<_>>();
    if u64::from(tree.next_leaf_to_insert()) == Accumulator::<H, S, DEPTH>::capacity()
        && DEPTH < 64
    {
        expected.insert(Address::from_parts(Level::from(DEPTH), 0));
    }
    expected
}

fn leaf_count<H: Hashable + Clone, S: NodeStore<H = H>, const DEPTH: u8>(max: u64) -> u64 {
    std::cmp::min(max, Accumulator::<H, S, DEPTH>::capacity())
}

/// Checks that the root after every insertion matches the root of a reference tree over all
/// leaves inserted so far.
pub fn check_roots<H, S, const DEPTH: u8, F>(new_tree: F)
where
    H: TestHashable,
    S: NodeStore<H = H>,
    F: Fn(usize) -> Accumulator<H, S, DEPTH>,
{
    let mut tree = new_tree(3);
    assert_eq!(tree.root(), &complete_tree::root::<H>(&[], DEPTH));

    let mut leaves = vec![];
    for i in 0..leaf_count::<H, S, DEPTH>(20) {
        let value = H::from_u64(i);
        leaves.push(value.clone());
        let inserted = tree.insert(value).unwrap();
        let expected = complete_tree::root(&leaves, DEPTH);
        assert_eq!(inserted.root(), &expected);
        assert_eq!(tree.root(), &expected);
        assert_eq!(tree.next_leaf_to_insert(), Position::from(i + 1));
    }
}

/// Checks that every index in the window has a complete frontier, and that the authentication
/// path derived from it matches the reference tree as of that index's insertion.
pub fn check_window_witnesses<H, S, const DEPTH: u8, F>(new_tree: F)
where
    H: TestHashable,
    S: NodeStore<H = H>,
    F: Fn(usize) -> Accumulator<H, S, DEPTH>,
{
    for history_size in [1usize, 2, 5] {
        let mut tree = new_tree(history_size);
        let mut leaves = vec![];
        for i in 0..leaf_count::<H, S, DEPTH>(6 * history_size as u64 + 3) {
            leaves.push(H::from_u64(i));
            tree.insert(H::from_u64(i)).unwrap();

            for j in 0..=i {
                let position = Position::from(j);
                if tree.is_in_window(position) {
                    let prefix = &leaves[..=(j as usize)];
                    let expected_root = complete_tree::root(prefix, DEPTH);
                    assert_eq!(tree.root_at(position), Some(&expected_root));
                    assert!(tree
                        .get_frontier_by_index(position)
                        .iter()
                        .all(|h| h.is_some()));

                    let path = tree.witness(position).unwrap();
                    assert_eq!(
                        path.siblings()
                            .iter()
                            .map(|(h, _)| h.clone())
                            .collect::<Vec<_>>(),
                        complete_tree::witness(prefix, position, DEPTH)
                    );
                    assert_eq!(path.root(leaves[j as usize].clone()), expected_root);
                } else {
                    assert!(matches!(
                        tree.witness(position),
                        Err(QueryError::Stale { .. })
                    ));
                    assert_eq!(tree.root_at(position), None);
                }
            }
        }
    }
}

/// Checks that, one insertion after an index leaves the window, at least one node of its
/// frontier path has been deleted.
pub fn check_reclamation<H, S, const DEPTH: u8, F>(new_tree: F)
where
    H: TestHashable,
    S: NodeStore<H = H>,
    F: Fn(usize) -> Accumulator<H, S, DEPTH>,
{
    let history_size = 4;
    let mut tree = new_tree(history_size);
    for i in 0..leaf_count::<H, S, DEPTH>(64) {
        tree.insert(H::from_u64(i)).unwrap();
        let reclaimed = u64::from(tree.oldest_retained()).saturating_sub(1);
        for j in 0..reclaimed {
            let position = Position::from(j);
            assert!(tree
                .calculate_path(position)
                .into_iter()
                .flatten()
                .any(|addr| tree.store().get(addr).is_none()));
            assert!(tree
                .get_frontier_by_index(position)
                .iter()
                .any(|h| h.is_none()));
        }
    }
}

/// Checks that the store retains exactly the nodes referenced by the window, and therefore no
/// more than `history_size * DEPTH` of them (plus the root of a full tree), after inserting ten
/// times as many leaves as the window holds.
pub fn check_retained_bound<H, S, const DEPTH: u8, F>(new_tree: F)
where
    H: TestHashable,
    S: NodeStore<H = H>,
    F: Fn(usize) -> Accumulator<H, S, DEPTH>,
{
    for history_size in [1usize, 3, 8] {
        let mut tree = new_tree(history_size);
        let mut stored = 0;
        let mut deleted = 0;
        for i in 0..leaf_count::<H, S, DEPTH>(10 * history_size as u64) {
            let inserted = tree.insert(H::from_u64(i)).unwrap();
            stored += inserted.events().iter().filter(|e| e.is_stored()).count();
            deleted += inserted.events().iter().filter(|e| e.is_deleted()).count();

            assert_eq!(tree.retained_nodes(), stored - deleted);
            assert_eq!(
                tree.store().addresses().into_iter().collect::<BTreeSet<_>>(),
                expected_retained(&tree)
            );
            assert!(tree.retained_nodes() <= history_size * usize::from(DEPTH) + 1);
        }
    }
}
