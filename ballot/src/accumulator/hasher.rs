//! Decorator for a cryptographic hasher that implements the accumulator-specific hashing logic.

use commonware_cryptography::Hasher as CHasher;

/// Prefix of a leaf digest.
const LEAF_PREFIX: u8 = 0;

/// Prefix of an internal node digest.
const NODE_PREFIX: u8 = 1;

/// Prefix of the digest of a leaf that holds no value.
const EMPTY_PREFIX: u8 = 2;

/// The standard hasher to use with an [super::Accumulator] for computing leaf, node and empty
/// digests.
///
/// Each kind of digest is prefixed with a distinct byte so that a leaf can never be confused with
/// an internal node (or with the empty leaf) when reconstructing a root from a [super::Proof].
pub struct Standard<'a, H: CHasher> {
    hasher: &'a mut H,
}

impl<'a, H: CHasher> Standard<'a, H> {
    /// Creates a new [Standard] hasher.
    pub fn new(hasher: &'a mut H) -> Self {
        Self { hasher }
    }

    /// Computes the digest of a leaf that commits `value` under `key`.
    pub fn leaf_digest(&mut self, key: &H::Digest, value: &H::Digest) -> H::Digest {
        self.hasher.update(&[LEAF_PREFIX]);
        self.hasher.update(key.as_ref());
        self.hasher.update(value.as_ref());
        self.hasher.finalize()
    }

    /// Computes the digest of an internal node given the digests of its children.
    pub fn node_digest(&mut self, left: &H::Digest, right: &H::Digest) -> H::Digest {
        self.hasher.update(&[NODE_PREFIX]);
        self.hasher.update(left.as_ref());
        self.hasher.update(right.as_ref());
        self.hasher.finalize()
    }

    /// Computes the digest of a leaf that holds no value.
    pub fn empty_digest(&mut self) -> H::Digest {
        self.hasher.update(&[EMPTY_PREFIX]);
        self.hasher.finalize()
    }

    /// Returns the digest of an empty subtree for every height in `0..=height`.
    ///
    /// Entry `h` is the root of a perfect subtree of height `h` whose leaves are all empty.
    pub fn empty_subtrees(&mut self, height: usize) -> Vec<H::Digest> {
        let mut digests = Vec::with_capacity(height + 1);
        let mut digest = self.empty_digest();
        digests.push(digest);
        for _ in 0..height {
            digest = self.node_digest(&digest, &digest);
            digests.push(digest);
        }
        digests
    }
}
