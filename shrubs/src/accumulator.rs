//! The accumulator: leaf insertion, window management and path queries.
use std::fmt::Debug;
use std::num::NonZeroUsize;

use tracing::{debug, trace, warn};

use crate::{
    error::{InsertionError, QueryError},
    event::Event,
    frontier::{self, climb, Step},
    history::{HistoryIndex, HistoryRecord, Touch},
    meter::{CostSchedule, Meter},
    store::NodeStore,
    witness::AuthPath,
    Address, Hashable, Level, Position,
};

/// The window width used when none is specified.
pub const DEFAULT_HISTORY_SIZE: usize = 100;

/// The result of a successful insertion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Inserted<H> {
    index: Position,
    root: H,
    events: Vec<Event>,
}

impl<H> Inserted<H> {
    /// Returns the index at which the leaf was inserted.
    pub fn index(&self) -> Position {
        self.index
    }

    /// Returns the root of the tree after the insertion.
    pub fn root(&self) -> &H {
        &self.root
    }

    /// Returns the diagnostics emitted by the insertion, in the order they occurred.
    pub fn events(&self) -> &[Event] {
        &self.events
    }
}

/// The changes computed by an insertion's climb, not yet applied to the accumulator.
struct Staged<H> {
    touches: Vec<Touch>,
    stored: (Address, H),
    root: H,
}

/// An append-only Merkle tree of depth `DEPTH` that retains the frontier paths of its most
/// recent `history_size` insertions in a [`NodeStore`].
#[derive(Debug)]
pub struct Accumulator<H, S, const DEPTH: u8> {
    store: S,
    history: HistoryIndex<H>,
    history_size: NonZeroUsize,
    next_index: Position,
    root: H,
    /// The empty subtree roots for levels `0..=DEPTH`.
    empty_roots: Vec<H>,
    /// For each level, the index of the node most recently deleted at that level by cleanup.
    superseded: Vec<Option<u64>>,
    schedule: CostSchedule,
    gas_limit: Option<u64>,
}

impl<H: Hashable + Clone, S: NodeStore<H = H>, const DEPTH: u8> Accumulator<H, S, DEPTH> {
    /// Creates an empty accumulator backed by the given store, which should not contain any
    /// nodes.
    ///
    /// # Panics
    ///
    /// Panics if `DEPTH` is zero or greater than 64.
    pub fn new(store: S, history_size: NonZeroUsize) -> Self {
        assert!(
            DEPTH > 0 && DEPTH <= 64,
            "tree depth must be between 1 and 64"
        );
        let empty_roots = Level::from(0)
            .iter_to(Level::from(DEPTH))
            .fold(vec![H::empty_leaf()], |mut roots, level| {
                let child = &roots[usize::from(level)];
                let parent = H::combine(level, child, child);
                roots.push(parent);
                roots
            });

        Accumulator {
            store,
            history: HistoryIndex::empty(),
            history_size,
            next_index: Position::from(0),
            root: empty_roots[usize::from(DEPTH)].clone(),
            empty_roots,
            superseded: vec![None; usize::from(DEPTH)],
            schedule: CostSchedule::default(),
            gas_limit: None,
        }
    }

    /// Enables reporting of the budget remaining after each insertion's climb, given a limit on
    /// the cost of a single insertion.
    pub fn with_gas_limit(mut self, limit: u64) -> Self {
        self.gas_limit = Some(limit);
        self
    }

    /// Sets the costs charged for storage accesses and hashing when a gas limit is configured.
    pub fn with_cost_schedule(mut self, schedule: CostSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Returns the maximum number of leaves the tree can hold.
    pub fn capacity() -> u64 {
        if DEPTH >= 64 {
            u64::MAX
        } else {
            1 << DEPTH
        }
    }

    pub fn depth(&self) -> u8 {
        DEPTH
    }

    /// Returns the width of the window, in insertions.
    pub fn history_size(&self) -> usize {
        self.history_size.get()
    }

    /// Returns the index at which the next leaf will be inserted.
    pub fn next_leaf_to_insert(&self) -> Position {
        self.next_index
    }

    /// Returns the oldest index for which a frontier path is guaranteed to be available.
    pub fn oldest_retained(&self) -> Position {
        Position::from(u64::from(self.next_index).saturating_sub(self.history_size.get() as u64))
    }

    /// Returns whether the given index lies within the window.
    pub fn is_in_window(&self, index: Position) -> bool {
        self.oldest_retained() <= index && index < self.next_index
    }

    /// Returns the current root of the tree.
    pub fn root(&self) -> &H {
        &self.root
    }

    /// Returns the root produced by the insertion at `index`, if that index is in the window.
    pub fn root_at(&self, index: Position) -> Option<&H> {
        self.history.get(index).map(|r| r.root())
    }

    /// Returns the node store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the number of nodes retained by the store.
    pub fn retained_nodes(&self) -> usize {
        self.store.len()
    }

    /// Returns the records of the insertions in the window.
    pub fn history(&self) -> &HistoryIndex<H> {
        &self.history
    }

    /// Returns the hash of the node at the given level and position, if it is retained.
    pub fn get_node_hash(&self, level: Level, position: u64) -> Option<H> {
        self.store.get(Address::from_parts(level, position))
    }

    /// Computes the addresses of the frontier nodes at each level below the root immediately
    /// after the insertion at `index`. See [`frontier::calculate_path`].
    pub fn calculate_path(&self, index: Position) -> Vec<Option<Address>> {
        frontier::calculate_path(index, DEPTH)
    }

    /// Returns the hashes of the frontier nodes at each level below the root immediately after
    /// the insertion at `index`.
    ///
    /// Levels at which no node had been completed at that time are filled by the empty subtree
    /// root if `index` is in the window. An entry is `None` if its node is no longer retained,
    /// and every entry of an index outside the window that is not still retained is `None`.
    pub fn get_frontier_by_index(&self, index: Position) -> Vec<Option<H>> {
        if index >= self.next_index {
            return vec![None; usize::from(DEPTH)];
        }

        let in_window = self.is_in_window(index);
        self.calculate_path(index)
            .into_iter()
            .enumerate()
            .map(|(level, addr)| match addr {
                Some(addr) => self.store.get(addr),
                None if in_window => Some(self.empty_roots[level].clone()),
                None => None,
            })
            .collect()
    }

    /// Returns the authentication path of the leaf at `index` against the root produced by its
    /// insertion, which is available from [`Self::root_at`] while `index` is in the window.
    pub fn witness(&self, index: Position) -> Result<AuthPath<H>, QueryError> {
        if index >= self.next_index {
            return Err(QueryError::NotInserted(index));
        }
        if !self.is_in_window(index) {
            return Err(QueryError::Stale {
                index,
                oldest_retained: self.oldest_retained(),
            });
        }

        let siblings = self
            .get_frontier_by_index(index)
            .into_iter()
            .enumerate()
            .map(|(level, value)| {
                let ancestor = Address::above_position(Level::from(level as u8), index);
                match Step::of(ancestor) {
                    // A right-child ancestor's sibling is the frontier node at its level.
                    Step::Combine { left } => value.ok_or(QueryError::NodeUnavailable(left)),
                    // Nothing had been inserted to the right of a left-child ancestor yet.
                    Step::Store => Ok(self.empty_roots[level].clone()),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(AuthPath::from_parts(index, siblings))
    }

    /// Computes the changes made by inserting `leaf` at `index` without applying them.
    fn stage(
        &self,
        index: Position,
        leaf: H,
        meter: &mut Option<Meter>,
    ) -> Result<Staged<H>, InsertionError> {
        let mut current = leaf;
        let mut touches = vec![];
        for (addr, step) in climb(index, DEPTH) {
            match step {
                Step::Combine { left } => {
                    let left_value = self
                        .store
                        .get(left)
                        .ok_or(InsertionError::FrontierEntryMissing(left))?;
                    if let Some(m) = meter.as_mut() {
                        m.load();
                        m.hash();
                    }
                    trace!(?addr, ?left, "Combining with pending left sibling");
                    current = H::combine(addr.level(), &left_value, &current);
                    touches.push(Touch::Deleted(left));
                }
                Step::Store => {
                    touches.push(Touch::Stored(addr));
                    let stored = (addr, current);
                    let root = self.root_with(index + 1, &stored, meter)?;
                    return Ok(Staged {
                        touches,
                        stored,
                        root,
                    });
                }
            }
        }

        unreachable!("The climb always terminates with a store step at or below the root.")
    }

    /// Computes the root of the tree containing `size` leaves, given the node that the insertion
    /// producing that tree is about to store.
    fn root_with(
        &self,
        size: Position,
        stored: &(Address, H),
        meter: &mut Option<Meter>,
    ) -> Result<H, InsertionError> {
        if stored.0.level() == Level::from(DEPTH) {
            // the tree is full
            return Ok(stored.1.clone());
        }

        Level::from(0)
            .iter_to(Level::from(DEPTH))
            .try_fold(self.empty_roots[0].clone(), |digest, level| {
                let count = u64::from(size) >> u8::from(level);
                if let Some(m) = meter.as_mut() {
                    m.hash();
                }
                if count & 0x1 == 1 {
                    let left = Address::from_parts(level, count - 1);
                    let left_value = if left == stored.0 {
                        stored.1.clone()
                    } else {
                        if let Some(m) = meter.as_mut() {
                            m.load();
                        }
                        self.store
                            .get(left)
                            .ok_or(InsertionError::FrontierEntryMissing(left))?
                    };
                    Ok(H::combine(level, &left_value, &digest))
                } else {
                    Ok(H::combine(
                        level,
                        &digest,
                        &self.empty_roots[usize::from(level)],
                    ))
                }
            })
    }
}

impl<H: Hashable + Clone + PartialEq + Debug, S: NodeStore<H = H>, const DEPTH: u8>
    Accumulator<H, S, DEPTH>
{
    /// Appends a leaf to the tree, returning its index, the new root, and the diagnostics
    /// emitted along the way.
    ///
    /// The climb's changes to the frontier are reported first, in climb order: a
    /// [`Event::Consumed`] for each pending left sibling that was combined, then the
    /// [`Event::Stored`] of the node that became a pending left sibling.
    ///
    /// If the insertion pushes an index out of the window, the nodes that only that index
    /// referred to are deleted from the store. Cleanup never causes the insertion to fail.
    pub fn insert(&mut self, leaf: H) -> Result<Inserted<H>, InsertionError> {
        let index = self.next_index;
        if u64::from(index) >= Self::capacity() {
            return Err(InsertionError::TreeFull);
        }

        let mut meter = self.gas_limit.map(|limit| Meter::new(self.schedule, limit));
        let Staged {
            touches,
            stored,
            root,
        } = self.stage(index, leaf, &mut meter)?;

        // Nothing below this point may fail.
        let mut events = touches
            .iter()
            .map(|touch| {
                trace!(addr = ?touch.address(), ?touch, "Committing frontier change");
                match touch {
                    Touch::Stored(addr) => Event::Stored(*addr),
                    Touch::Deleted(addr) => Event::Consumed(*addr),
                }
            })
            .collect::<Vec<_>>();
        self.store.put(stored.0, stored.1);
        if let Some(m) = meter.as_mut() {
            m.store();
        }

        self.history
            .push(HistoryRecord::from_parts(index, touches, root.clone()));
        self.root = root.clone();
        self.next_index = index + 1;
        debug!(
            index = u64::from(index),
            root = ?self.root,
            "Inserted leaf"
        );

        if let Some(m) = meter {
            debug!(used = m.used(), remaining = m.remaining(), "Metered insertion");
            events.push(Event::GasLeft(m.remaining()));
        }

        let history_size = self.history_size.get() as u64;
        if u64::from(self.next_index) > history_size {
            self.cleanup(self.next_index - (history_size + 1), &mut events);
        }

        Ok(Inserted {
            index,
            root,
            events,
        })
    }

    /// Appends an empty leaf to the tree.
    pub fn insert_empty(&mut self) -> Result<Inserted<H>, InsertionError> {
        self.insert(H::empty_leaf())
    }

    /// Returns whether the given root was produced by one of the insertions in the window.
    pub fn is_known_root(&self, root: &H) -> bool {
        self.history.iter().any(|r| r.root() == root)
    }

    /// Deletes the nodes referenced by the frontier path of `retiring`, the index that has just
    /// left the window, that no index in the window refers to any longer.
    ///
    /// A frontier node of `retiring` is still referenced exactly when the oldest index in the
    /// window did not overwrite that level of the frontier.
    fn cleanup(&mut self, retiring: Position, events: &mut Vec<Event>) {
        events.push(Event::CleanupFor(retiring));
        debug!(retiring = u64::from(retiring), "Cleaning up");

        match self.history.oldest_index() {
            Some(oldest) if oldest == retiring => {
                self.history.retire_oldest();
            }
            oldest => warn!(
                retiring = u64::from(retiring),
                oldest = ?oldest.map(u64::from),
                "History index out of step with the window"
            ),
        }

        let successor = match self.history.get(retiring + 1) {
            Some(record) => record,
            None => {
                warn!(
                    retiring = u64::from(retiring),
                    "No history record for the oldest index in the window; skipping cleanup"
                );
                return;
            }
        };

        for (level, addr) in frontier::calculate_path(retiring, DEPTH)
            .into_iter()
            .enumerate()
        {
            let addr = match addr {
                Some(addr) => addr,
                None => continue,
            };
            let overwriting = match successor.stored_at(addr.level()) {
                Some(overwriting) => overwriting,
                // still part of the successor's frontier path
                None => continue,
            };

            let behind = match self.superseded[level] {
                Some(superseded) if addr.index() <= superseded => Some(superseded),
                _ if overwriting.index() <= addr.index() => Some(overwriting.index()),
                _ => None,
            };
            if let Some(superseded) = behind {
                warn!(
                    level,
                    position = addr.index(),
                    superseded,
                    "Cleanup went backwards; leaving node in place"
                );
                events.push(Event::WentBackwards {
                    level: addr.level(),
                    position: addr.index(),
                    superseded,
                });
                continue;
            }

            if self.store.remove(addr).is_some() {
                trace!(?addr, "Deleted node");
                events.push(Event::Deleted(addr));
            }
            self.superseded[level] = Some(addr.index());
        }
    }
}
