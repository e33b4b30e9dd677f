//! The per-insertion log of the nodes touched by each insertion in the window.
use std::collections::VecDeque;

use crate::{Address, Level, Position};

/// A change to the frontier made by an insertion's climb.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Touch {
    /// The node was written to the store and became the pending left sibling of its level.
    Stored(Address),
    /// The node was removed from the frontier when it was combined with its right sibling. The
    /// node itself stays in the store until no insertion in the window refers to it.
    Deleted(Address),
}

impl Touch {
    /// Returns the address of the touched node.
    pub fn address(&self) -> Address {
        match self {
            Touch::Stored(addr) | Touch::Deleted(addr) => *addr,
        }
    }
}

/// The record of a single insertion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryRecord<H> {
    index: Position,
    touches: Vec<Touch>,
    root: H,
}

impl<H> HistoryRecord<H> {
    /// Constructs a record from its constituent parts.
    pub fn from_parts(index: Position, touches: Vec<Touch>, root: H) -> Self {
        HistoryRecord {
            index,
            touches,
            root,
        }
    }

    /// Returns the index of the insertion.
    pub fn index(&self) -> Position {
        self.index
    }

    /// Returns the touches made by the insertion, in the order the climb made them.
    pub fn touches(&self) -> &[Touch] {
        &self.touches
    }

    /// Returns the root of the tree produced by the insertion.
    pub fn root(&self) -> &H {
        &self.root
    }

    /// Returns the address of the node that the insertion stored at the given level, if any.
    pub fn stored_at(&self, level: Level) -> Option<Address> {
        self.touches.iter().find_map(|t| match t {
            Touch::Stored(addr) if addr.level() == level => Some(*addr),
            _ => None,
        })
    }
}

/// The records of the insertions in the current window, oldest first.
///
/// Records are appended in insertion order and retired from the front, so that the indices of
/// the retained records are always contiguous.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryIndex<H> {
    records: VecDeque<HistoryRecord<H>>,
}

impl<H> HistoryIndex<H> {
    /// Constructs an empty history.
    pub fn empty() -> Self {
        HistoryIndex {
            records: VecDeque::new(),
        }
    }

    /// Returns the index of the oldest retained record, if any.
    pub fn oldest_index(&self) -> Option<Position> {
        self.records.front().map(|r| r.index)
    }

    /// Returns the number of retained records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns whether no records are retained.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the record for the insertion at `index`, if it is still retained.
    pub fn get(&self, index: Position) -> Option<&HistoryRecord<H>> {
        let oldest = self.oldest_index()?;
        let offset = u64::from(index).checked_sub(oldest.into())?;
        usize::try_from(offset)
            .ok()
            .and_then(|offset| self.records.get(offset))
    }

    /// Returns an iterator over the retained records, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &HistoryRecord<H>> {
        self.records.iter()
    }

    /// Appends a record. The index of the record must immediately follow the index of the
    /// most recently appended record.
    pub fn push(&mut self, record: HistoryRecord<H>) {
        debug_assert!(self
            .records
            .back()
            .map_or(true, |last| last.index + 1 == record.index));
        self.records.push_back(record);
    }

    /// Removes and returns the oldest retained record.
    pub fn retire_oldest(&mut self) -> Option<HistoryRecord<H>> {
        self.records.pop_front()
    }
}

impl<H> Default for HistoryIndex<H> {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{HistoryIndex, HistoryRecord, Touch};
    use crate::{Address, Level, Position};

    fn addr(level: u8, index: u64) -> Address {
        Address::from_parts(Level::from(level), index)
    }

    fn record(index: u64, touches: Vec<Touch>) -> HistoryRecord<String> {
        HistoryRecord::from_parts(Position::from(index), touches, format!("root{}", index))
    }

    #[test]
    fn stored_at() {
        let r = record(
            3,
            vec![
                Touch::Deleted(addr(0, 2)),
                Touch::Deleted(addr(1, 0)),
                Touch::Stored(addr(2, 0)),
            ],
        );
        assert_eq!(r.stored_at(Level::from(2)), Some(addr(2, 0)));
        assert_eq!(r.stored_at(Level::from(0)), None);
        assert_eq!(r.touches()[1].address(), addr(1, 0));
    }

    #[test]
    fn push_get_retire() {
        let mut history = HistoryIndex::empty();
        assert_eq!(history.get(Position::from(0)), None);
        for i in 5..9 {
            history.push(record(i, vec![]));
        }
        assert_eq!(history.len(), 4);
        assert_eq!(history.oldest_index(), Some(Position::from(5)));
        assert_eq!(history.get(Position::from(4)), None);
        assert_eq!(history.get(Position::from(7)).map(|r| r.root().as_str()), Some("root7"));
        assert_eq!(history.get(Position::from(9)), None);

        assert_eq!(history.retire_oldest().map(|r| r.index()), Some(Position::from(5)));
        assert_eq!(history.get(Position::from(5)), None);
        assert_eq!(history.oldest_index(), Some(Position::from(6)));
    }
}
