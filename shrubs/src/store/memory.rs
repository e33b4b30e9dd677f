//! In-memory node storage.
use std::collections::BTreeMap;

use super::NodeStore;
use crate::Address;

/// An implementation of [`NodeStore`] that retains nodes in a map held in memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryNodeStore<H> {
    nodes: BTreeMap<Address, H>,
}

impl<H> MemoryNodeStore<H> {
    /// Constructs a new empty store.
    pub fn empty() -> Self {
        Self {
            nodes: BTreeMap::new(),
        }
    }
}

impl<H> Default for MemoryNodeStore<H> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<H: Clone> NodeStore for MemoryNodeStore<H> {
    type H = H;

    fn get(&self, addr: Address) -> Option<H> {
        self.nodes.get(&addr).cloned()
    }

    fn put(&mut self, addr: Address, value: H) -> Option<H> {
        self.nodes.insert(addr, value)
    }

    fn remove(&mut self, addr: Address) -> Option<H> {
        self.nodes.remove(&addr)
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn addresses(&self) -> Vec<Address> {
        self.nodes.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryNodeStore;
    use crate::{store::NodeStore, Address, Level};

    #[test]
    fn put_get_remove() {
        let addr = |l: u8, i| Address::from_parts(Level::from(l), i);
        let mut store = MemoryNodeStore::empty();
        assert!(store.is_empty());

        assert_eq!(store.put(addr(0, 0), "a".to_string()), None);
        assert_eq!(store.put(addr(1, 0), "ab".to_string()), None);
        assert_eq!(store.put(addr(0, 2), "c".to_string()), None);
        assert_eq!(store.len(), 3);
        assert_eq!(store.get(addr(1, 0)), Some("ab".to_string()));
        assert_eq!(store.get(addr(1, 1)), None);
        assert_eq!(store.addresses(), vec![addr(0, 0), addr(0, 2), addr(1, 0)]);

        assert_eq!(store.remove(addr(0, 0)), Some("a".to_string()));
        assert_eq!(store.remove(addr(0, 0)), None);
        assert_eq!(store.get(addr(0, 0)), None);
        assert_eq!(store.len(), 2);
    }
}
