//! Diagnostics emitted by an insertion.
use std::fmt;

use crate::{Address, Level, Position};

/// A diagnostic emitted by [`Accumulator::insert`], returned in the order it occurred.
///
/// [`Accumulator::insert`]: crate::Accumulator::insert
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// A node was written to the store.
    Stored(Address),
    /// A pending left sibling was combined with its right sibling and so deleted from the
    /// frontier. The node remains in the store until no index in the window refers to it.
    Consumed(Address),
    /// A node was deleted from the store.
    Deleted(Address),
    /// The remaining execution budget after the insertion's climb.
    GasLeft(u64),
    /// Cleanup of the nodes referenced only by the given index has started.
    CleanupFor(Position),
    /// Cleanup at the given level was abandoned because the node it was about to delete is not
    /// ahead of the most recent node already deleted at that level.
    WentBackwards {
        level: Level,
        position: u64,
        superseded: u64,
    },
}

impl Event {
    pub fn is_stored(&self) -> bool {
        matches!(self, Event::Stored(_))
    }

    pub fn is_consumed(&self) -> bool {
        matches!(self, Event::Consumed(_))
    }

    /// Returns whether this event records the deletion of a node from the store.
    pub fn is_deleted(&self) -> bool {
        matches!(self, Event::Deleted(_))
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Stored(addr) => write!(f, "Stored {:?}", addr),
            Event::Consumed(addr) => write!(f, "Consumed {:?}", addr),
            Event::Deleted(addr) => write!(f, "Deleted {:?}", addr),
            Event::GasLeft(gas) => write!(f, "GasLeft {}", gas),
            Event::CleanupFor(index) => write!(f, "CleanupFor {}", u64::from(*index)),
            Event::WentBackwards {
                level,
                position,
                superseded,
            } => write!(
                f,
                "WentBackwards at level {}: position {} is not ahead of {}",
                u8::from(*level),
                position,
                superseded
            ),
        }
    }
}
