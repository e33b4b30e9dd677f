//! The parity rule that drives each insertion's climb, and the reconstruction of historical
//! frontier paths from it.
//!
//! Nothing in this module reads node values: the addresses that an insertion touches, and the
//! addresses that form the frontier immediately after any insertion, are pure functions of the
//! insertion index.
use crate::{Address, Level, Position};

/// What an insertion does with the node it is carrying at a given level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// The node is a left child. It is written to the store as the pending left sibling of its
    /// level and the climb stops.
    Store,
    /// The node is a right child. It is combined with the pending left sibling at the address
    /// carried here, and the climb continues with the parent.
    Combine { left: Address },
}

impl Step {
    /// Determines the step taken for the node at `addr`.
    pub fn of(addr: Address) -> Step {
        if addr.is_right_child() {
            Step::Combine {
                left: addr.sibling(),
            }
        } else {
            Step::Store
        }
    }
}

/// An iterator over the addresses visited by the insertion of the leaf at a given position,
/// together with the step taken at each of them. The final item is always a [`Step::Store`].
#[derive(Clone, Debug)]
pub struct Climb {
    next: Option<Address>,
    depth: Level,
}

impl Iterator for Climb {
    type Item = (Address, Step);

    fn next(&mut self) -> Option<Self::Item> {
        let addr = self.next.take()?;
        let step = if addr.level() == self.depth {
            // The root of a full tree has no sibling.
            Step::Store
        } else {
            Step::of(addr)
        };
        if let Step::Combine { .. } = step {
            self.next = Some(addr.parent());
        }
        Some((addr, step))
    }
}

/// Returns the climb performed by the insertion of the leaf at `position` into a tree of the
/// given depth.
pub fn climb(position: Position, depth: u8) -> Climb {
    Climb {
        next: Some(position.into()),
        depth: depth.into(),
    }
}

/// Returns the address of the frontier node at `level` immediately after the insertion of the
/// leaf at `index`, or `None` if no node at that level had been completed yet.
///
/// Below the level at which `index` is stored, every ancestor of the leaf is a right child and
/// the frontier holds its left sibling. At the store level the frontier holds the ancestor
/// itself. Above it, an ancestor that is a right child again has its left sibling in the
/// frontier, while a left-child ancestor is still incomplete and the frontier holds the most
/// recent left child that precedes it.
pub fn frontier_address(index: Position, level: Level) -> Option<Address> {
    let ancestor = Address::above_position(level, index);
    let at = |i| Address::from_parts(level, i);
    match Step::of(ancestor) {
        Step::Combine { left } => Some(left),
        Step::Store if level == index.store_level() => Some(ancestor),
        Step::Store => ancestor.index().checked_sub(2).map(at),
    }
}

/// Computes the frontier path of `index` in a tree of the given depth: the addresses of the
/// frontier nodes at levels `0..depth` immediately after the insertion of `index`.
pub fn calculate_path(index: Position, depth: u8) -> Vec<Option<Address>> {
    Level::from(0)
        .iter_to(depth.into())
        .map(|level| frontier_address(index, level))
        .collect()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{calculate_path, climb, frontier_address, Step};
    use crate::{Address, Level, Position};

    fn addr(level: u8, index: u64) -> Address {
        Address::from_parts(Level::from(level), index)
    }

    #[test]
    fn climb_stops_at_first_left_child() {
        assert_eq!(
            climb(Position::from(0), 4).collect::<Vec<_>>(),
            vec![(addr(0, 0), Step::Store)]
        );
        assert_eq!(
            climb(Position::from(3), 4).collect::<Vec<_>>(),
            vec![
                (addr(0, 3), Step::Combine { left: addr(0, 2) }),
                (addr(1, 1), Step::Combine { left: addr(1, 0) }),
                (addr(2, 0), Step::Store),
            ]
        );
        assert_eq!(
            climb(Position::from(5), 4).collect::<Vec<_>>(),
            vec![
                (addr(0, 5), Step::Combine { left: addr(0, 4) }),
                (addr(1, 2), Step::Store),
            ]
        );
    }

    #[test]
    fn climb_of_last_leaf_reaches_root() {
        let steps = climb(Position::from(7), 3).collect::<Vec<_>>();
        assert_eq!(steps.len(), 4);
        assert_eq!(steps[3], (addr(3, 0), Step::Store));
    }

    #[test]
    fn frontier_paths() {
        assert_eq!(
            calculate_path(Position::from(0), 4),
            vec![Some(addr(0, 0)), None, None, None]
        );
        assert_eq!(
            calculate_path(Position::from(4), 4),
            vec![Some(addr(0, 4)), Some(addr(1, 0)), Some(addr(2, 0)), None]
        );
        assert_eq!(
            calculate_path(Position::from(5), 4),
            vec![Some(addr(0, 4)), Some(addr(1, 2)), Some(addr(2, 0)), None]
        );
        assert_eq!(
            calculate_path(Position::from(7), 4),
            vec![
                Some(addr(0, 6)),
                Some(addr(1, 2)),
                Some(addr(2, 0)),
                Some(addr(3, 0))
            ]
        );
    }

    proptest! {
        #[test]
        fn frontier_address_closed_form(index in 0u64..(1 << 20), level in 0u8..21) {
            let m = (index + 1) >> level;
            let expected = if m == 0 {
                None
            } else {
                Some(addr(level, (m - 1) & !1))
            };
            prop_assert_eq!(frontier_address(Position::from(index), Level::from(level)), expected);
        }

        #[test]
        fn calculate_path_is_deterministic(index in 0u64..(1 << 32)) {
            let position = Position::from(index);
            prop_assert_eq!(calculate_path(position, 32), calculate_path(position, 32));
        }

        #[test]
        fn store_step_is_on_frontier(index in 0u64..(1 << 20)) {
            // The node that an insertion stores is exactly its frontier entry at that level.
            let position = Position::from(index);
            let (stored, _) = climb(position, 20).last().unwrap();
            prop_assert_eq!(frontier_address(position, stored.level()), Some(stored));
        }
    }
}
