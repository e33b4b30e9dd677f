use std::fmt;

use crate::{Address, Position};

/// Errors which can occur when inserting a leaf. An insertion that fails leaves the
/// accumulator unchanged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InsertionError {
    /// The tree already contains the maximum number of leaves.
    TreeFull,
    /// The pending left sibling that a right child must be combined with was not found in the
    /// store. This indicates that the store has been modified outside of the accumulator.
    FrontierEntryMissing(Address),
}

impl fmt::Display for InsertionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self {
            InsertionError::TreeFull => {
                write!(f, "The tree already contains the maximum number of leaves.")
            }
            InsertionError::FrontierEntryMissing(addr) => write!(
                f,
                "Frontier entry at address {:?} is missing from the node store.",
                addr
            ),
        }
    }
}

impl std::error::Error for InsertionError {}

/// Errors which can occur when querying the authentication path of a leaf.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryError {
    /// No leaf has been inserted at the requested index yet.
    NotInserted(Position),
    /// The requested index has left the window; its path is no longer guaranteed to be
    /// available.
    Stale {
        index: Position,
        oldest_retained: Position,
    },
    /// A node required for the path is absent from the store.
    NodeUnavailable(Address),
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::NotInserted(index) => {
                write!(f, "No leaf has been inserted at index {}.", u64::from(*index))
            }
            QueryError::Stale {
                index,
                oldest_retained,
            } => write!(
                f,
                "Index {} has left the window, which begins at index {}.",
                u64::from(*index),
                u64::from(*oldest_retained)
            ),
            QueryError::NodeUnavailable(addr) => {
                write!(f, "Node at address {:?} is not available.", addr)
            }
        }
    }
}

impl std::error::Error for QueryError {}
