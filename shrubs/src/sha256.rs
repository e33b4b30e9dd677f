use std::fmt;

use sha2::{Digest, Sha256};

use crate::{Hashable, Level};

/// A 32-byte node value whose parents are computed as the SHA-256 digest of the
/// concatenation of the left and right child values. The empty leaf is the all-zero value.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Sha256Node(pub [u8; 32]);

impl Sha256Node {
    /// Hashes arbitrary data into a leaf value.
    pub fn digest(data: &[u8]) -> Self {
        Sha256Node(Sha256::digest(data).into())
    }
}

impl Hashable for Sha256Node {
    fn empty_leaf() -> Self {
        Sha256Node([0; 32])
    }

    fn combine(_: Level, a: &Self, b: &Self) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(a.0);
        hasher.update(b.0);
        Sha256Node(hasher.finalize().into())
    }
}

impl AsRef<[u8]> for Sha256Node {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Sha256Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sha256Node({})", hex::encode(self.0))
    }
}

impl fmt::Display for Sha256Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::Sha256Node;
    use crate::{Hashable, Level};

    #[test]
    fn empty_roots() {
        // SHA-256 of 64 zero bytes
        assert_eq!(
            Sha256Node::empty_root(Level::from(1)).to_string(),
            "f5a5fd42d16a20302798ef6ed309979b43003d2320d9f0e8ea9831a92759fb4b"
        );
        assert_eq!(Sha256Node::empty_root(Level::from(0)), Sha256Node([0; 32]));
    }

    #[test]
    fn combine_is_ordered() {
        let a = Sha256Node::digest(b"a");
        let b = Sha256Node::digest(b"b");
        assert_ne!(
            Sha256Node::combine(Level::from(0), &a, &b),
            Sha256Node::combine(Level::from(0), &b, &a)
        );
    }
}
