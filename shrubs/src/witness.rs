use crate::{Hashable, Level, Position};

/// An authentication path from a leaf to the root of the tree as of the insertion of that leaf.
///
/// Each element of the path is the sibling of the leaf's ancestor at the corresponding level,
/// paired with whether that sibling is the left child.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthPath<H> {
    position: Position,
    siblings: Vec<(H, bool)>,
}

impl<H> AuthPath<H> {
    /// Constructs an authentication path directly from its position and siblings, ordered from
    /// the leaf level upward. The left/right determination of each sibling is derived from the
    /// position.
    pub fn from_parts(position: Position, siblings: Vec<H>) -> Self {
        let siblings = siblings
            .into_iter()
            .enumerate()
            .map(|(i, h)| (h, (u64::from(position) >> i) & 0x1 == 1))
            .collect();
        AuthPath { position, siblings }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Returns the siblings along the path, each paired with whether it is a left sibling.
    pub fn siblings(&self) -> &[(H, bool)] {
        &self.siblings
    }
}

impl<H: Hashable> AuthPath<H> {
    /// Returns the root of the tree corresponding to this path applied to `leaf`.
    pub fn root(&self, leaf: H) -> H {
        self.siblings
            .iter()
            .enumerate()
            .fold(leaf, |root, (i, (sibling, sibling_is_left))| {
                let level = Level::from(i as u8);
                if *sibling_is_left {
                    H::combine(level, sibling, &root)
                } else {
                    H::combine(level, &root, sibling)
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::AuthPath;
    use crate::Position;

    #[test]
    fn root_from_path() {
        // leaf "c" at position 2 of a depth-3 tree containing "a", "b", "c"
        let path = AuthPath::from_parts(
            Position::from(2),
            vec!["_".to_string(), "ab".to_string(), "____".to_string()],
        );
        assert_eq!(
            path.siblings().iter().map(|(_, l)| *l).collect::<Vec<_>>(),
            vec![false, true, false]
        );
        assert_eq!(path.root("c".to_string()), "abc_____");
    }
}
