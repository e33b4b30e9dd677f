//! Storage of retained tree nodes.
//!
//! A [`NodeStore`] is a sparse mapping from node [`Address`] to hash value. The accumulator
//! only ever writes the nodes that an insertion leaves as a pending left sibling, and deletes
//! them once no insertion in the window refers to them any longer. A missing entry therefore
//! means either that the node was never written or that it has been reclaimed; the store does
//! not distinguish the two.
use crate::Address;

pub mod memory;

/// A trait which describes the persistence of tree nodes by the accumulator.
///
/// Implementations must not fail: the accumulator stages all reads of an insertion before it
/// commits any writes, and relies on the writes of the commit phase taking effect as a whole.
pub trait NodeStore {
    /// The type of node values.
    type H;

    /// Returns the value stored at the given address, if any.
    fn get(&self, addr: Address) -> Option<Self::H>;

    /// Stores a value at the given address, returning the value it replaces, if any.
    fn put(&mut self, addr: Address, value: Self::H) -> Option<Self::H>;

    /// Removes the value at the given address, returning it if it was present.
    fn remove(&mut self, addr: Address) -> Option<Self::H>;

    /// Returns the number of retained nodes.
    fn len(&self) -> usize;

    /// Returns whether the store retains no nodes.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the addresses of all retained nodes, in ascending order.
    fn addresses(&self) -> Vec<Address>;
}
