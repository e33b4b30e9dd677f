//! # `shrubs`
//!
//! An append-only Merkle accumulator over a fixed-depth binary tree that keeps authentication
//! paths available for a bounded window of recent insertions, and reclaims the storage of
//! every node that only older insertions still referred to.
//!
//! Leaves are appended one at a time. Each insertion climbs the tree from level 0: a leaf (or
//! computed parent) at an even position becomes the pending left sibling of its level and is
//! written to the node store, while one at an odd position is combined with the pending left
//! sibling of its level and the climb continues with the parent. The set of nodes that were
//! the most recent left siblings at each level immediately after inserting index `i` is the
//! *frontier path* of `i`; it is sufficient to reconstruct an authentication path for leaf `i`
//! against the root produced by that insertion.
//!
//! ## Window
//!
//! The accumulator is parameterized by a window width `history_size`. Frontier paths are
//! guaranteed to be fully available for the most recent `history_size` insertions. After each
//! insertion that pushes an index out of the window, the nodes referenced only by that index
//! are deleted from the store, so that the number of retained nodes is bounded by
//! `history_size * DEPTH` regardless of how many leaves have been inserted in total.
//!
//! Callers that need to prove inclusion of a leaf after it has left the window must obtain its
//! [`witness::AuthPath`] before it expires.
use std::convert::TryFrom;
use std::num::TryFromIntError;
use std::ops::{Add, Sub};

pub mod accumulator;
pub mod error;
pub mod event;
pub mod frontier;
pub mod history;
pub mod meter;
pub mod sha256;
pub mod store;
pub mod witness;

#[cfg(any(test, feature = "test-dependencies"))]
pub mod testing;

pub use accumulator::{Accumulator, Inserted, DEFAULT_HISTORY_SIZE};
pub use error::{InsertionError, QueryError};
pub use event::Event;

/// A type representing the position of a leaf in a Merkle tree, which is also the
/// index of the insertion that appended it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Position(u64);

impl Position {
    /// Return whether the position is odd-valued.
    pub fn is_odd(&self) -> bool {
        self.0 & 0x1 == 1
    }

    /// Returns the level at which the insertion of a leaf at this position stops climbing;
    /// this is the number of trailing one bits of the position.
    pub fn store_level(&self) -> Level {
        Level(self.0.trailing_ones() as u8)
    }
}

impl From<Position> for u64 {
    fn from(p: Position) -> Self {
        p.0
    }
}

impl From<u64> for Position {
    fn from(value: u64) -> Self {
        Position(value)
    }
}

impl TryFrom<Position> for usize {
    type Error = TryFromIntError;
    fn try_from(p: Position) -> Result<usize, Self::Error> {
        <usize>::try_from(p.0)
    }
}

impl Add<u64> for Position {
    type Output = Position;
    fn add(self, other: u64) -> Self {
        Position(self.0 + other)
    }
}

impl Sub<u64> for Position {
    type Output = Position;
    fn sub(self, other: u64) -> Self {
        Position(self.0 - other)
    }
}

/// A type-safe wrapper for indexing into "levels" of a binary tree, such that
/// nodes at level `0` are leaves, nodes at level `1` are parents of nodes at
/// level `0`, and so forth.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Level(u8);

impl Level {
    // TODO: replace with an implementation of `std::iter::Step` once
    // `step_trait` is stabilized
    pub fn iter_to(self, other: Level) -> impl Iterator<Item = Self> {
        (self.0..other.0).map(Level)
    }
}

impl Add<u8> for Level {
    type Output = Self;
    fn add(self, value: u8) -> Self {
        Self(self.0 + value)
    }
}

impl From<u8> for Level {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> u8 {
        level.0
    }
}

impl From<Level> for usize {
    fn from(level: Level) -> usize {
        level.0 as usize
    }
}

/// The address of a node of the Merkle tree: the pair `(level, index)` with
/// `index < 2^(DEPTH - level)`. When `level == 0`, the index has the same value
/// as the position of the leaf.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address {
    level: Level,
    index: u64,
}

impl Address {
    pub fn from_parts(level: Level, index: u64) -> Self {
        Address { level, index }
    }

    /// Returns the address at `level` of the ancestor of the leaf at `position`.
    pub fn above_position(level: Level, position: Position) -> Self {
        Address {
            level,
            index: position.0 >> level.0,
        }
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn parent(&self) -> Address {
        Address {
            level: self.level + 1,
            index: self.index >> 1,
        }
    }

    pub fn sibling(&self) -> Address {
        Address {
            level: self.level,
            index: self.index ^ 0x1,
        }
    }

    /// Returns whether this node is the right child of its parent.
    pub fn is_right_child(&self) -> bool {
        self.index & 0x1 == 1
    }
}

impl From<Position> for Address {
    fn from(p: Position) -> Self {
        Address {
            level: 0.into(),
            index: p.into(),
        }
    }
}

/// A trait describing the operations that make a type suitable for use as
/// a leaf or node value in a merkle tree.
pub trait Hashable: Sized {
    fn empty_leaf() -> Self;

    fn combine(level: Level, a: &Self, b: &Self) -> Self;

    fn empty_root(level: Level) -> Self {
        Level::from(0)
            .iter_to(level)
            .fold(Self::empty_leaf(), |v, lvl| Self::combine(lvl, &v, &v))
    }
}
