//! A sparse, authenticated map from digest keys to digest values.
//!
//! # Terminology
//!
//! The [Accumulator] is a sparse Merkle tree with one leaf for every possible key. A key's path
//! from the root is given by its bits, most significant first, so the tree's height is equal to
//! the bit-width of the [commonware_cryptography::Digest] produced by the configured hasher (256
//! for SHA-256). Leaves that have never been set hold the _empty_ digest, and the root of any
//! subtree without a set leaf is a precomputed _empty subtree_ digest, so only the nodes along the
//! paths of set keys are stored.
//!
//! The "height" of a node is 0 for a leaf, 1 for the parent of 2 leaves, and so on. A node at
//! height `h` is identified by its _prefix_: the key of any leaf below it with its lowest `h` bits
//! cleared.
//!
//! Because every key has a fixed position, the root depends only on the assignment of values to
//! keys and never on the order in which they were set.
//!
//! # Example
//!
//! ```rust
//! use commonware_ballot::accumulator::Accumulator;
//! use commonware_cryptography::{Hasher, Sha256};
//!
//! let mut hasher = Sha256::new();
//! hasher.update(b"key");
//! let key = hasher.finalize();
//! hasher.update(b"value");
//! let value = hasher.finalize();
//!
//! let mut accumulator = Accumulator::<Sha256>::new();
//! accumulator.set(key, value);
//!
//! let proof = accumulator.witness(&key);
//! assert!(proof.verify_inclusion(&mut hasher, &key, &value, &accumulator.root()));
//! ```

use commonware_cryptography::Hasher as CHasher;
use std::collections::{BTreeMap, HashMap};

mod hasher;
pub use hasher::Standard;
mod proof;
pub use proof::Proof;

/// Returns whether bit `index` (counting from the least significant bit) of `key` is set.
pub(crate) fn bit(key: &[u8], index: usize) -> bool {
    let byte = key[key.len() - 1 - index / 8];
    (byte >> (index % 8)) & 1 == 1
}

/// Returns the prefix identifying the node at `height` above the leaf for `key`.
fn prefix(key: &[u8], height: usize) -> Vec<u8> {
    let mut prefix = key.to_vec();
    let len = prefix.len();
    let full = (height / 8).min(len);
    for byte in prefix.iter_mut().skip(len - full) {
        *byte = 0;
    }
    let partial = height % 8;
    if partial > 0 && full < len {
        prefix[len - 1 - full] &= !((1u8 << partial) - 1);
    }
    prefix
}

/// Returns the prefix of the sibling of the node at `height` above the leaf for `key`.
fn sibling(key: &[u8], height: usize) -> Vec<u8> {
    let mut sibling = prefix(key, height);
    let len = sibling.len();
    sibling[len - 1 - height / 8] ^= 1 << (height % 8);
    sibling
}

/// A sparse Merkle tree over digest keys and digest values.
pub struct Accumulator<H: CHasher> {
    hasher: H,

    // The number of levels between a leaf and the root.
    height: usize,

    // The digest of an empty subtree of each height in `0..=height`.
    empty: Vec<H::Digest>,

    // The value committed under each set key, in key order.
    values: BTreeMap<H::Digest, H::Digest>,

    // The non-empty nodes at each height in `0..=height`, keyed by prefix.
    nodes: Vec<HashMap<Vec<u8>, H::Digest>>,

    // The current root.
    root: H::Digest,
}

impl<H: CHasher> Default for Accumulator<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: CHasher> Accumulator<H> {
    /// Return a new (empty) [Accumulator].
    pub fn new() -> Self {
        let mut hasher = H::new();
        let height = hasher.finalize().as_ref().len() * 8;
        let empty = Standard::new(&mut hasher).empty_subtrees(height);
        let root = empty[height];
        Self {
            hasher,
            height,
            empty,
            values: BTreeMap::new(),
            nodes: vec![HashMap::new(); height + 1],
            root,
        }
    }

    /// Return the number of levels between a leaf and the root.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Return the number of keys that have been set.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Return whether no key has been set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Return the value last set for `key`, if any.
    pub fn get(&self, key: &H::Digest) -> Option<H::Digest> {
        self.values.get(key).copied()
    }

    /// Return the current root.
    pub fn root(&self) -> H::Digest {
        self.root
    }

    /// Return the digest of an empty tree (the root before any key is set).
    pub fn empty_root(&self) -> H::Digest {
        self.empty[self.height]
    }

    /// Iterate over all set `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&H::Digest, &H::Digest)> {
        self.values.iter()
    }

    /// Commit `value` under `key`, returning the previously committed value (if any).
    ///
    /// Only the `height` nodes on the path from the leaf to the root are recomputed.
    pub fn set(&mut self, key: H::Digest, value: H::Digest) -> Option<H::Digest> {
        let previous = self.values.insert(key, value);
        if previous == Some(value) {
            return previous;
        }

        let key_bytes = key.as_ref();
        let mut standard = Standard::new(&mut self.hasher);
        let mut digest = standard.leaf_digest(&key, &value);
        self.nodes[0].insert(key_bytes.to_vec(), digest);
        for height in 0..self.height {
            let sibling_digest = self.nodes[height]
                .get(&sibling(key_bytes, height))
                .copied()
                .unwrap_or(self.empty[height]);
            digest = if bit(key_bytes, height) {
                standard.node_digest(&sibling_digest, &digest)
            } else {
                standard.node_digest(&digest, &sibling_digest)
            };
            self.nodes[height + 1].insert(prefix(key_bytes, height + 1), digest);
        }
        self.root = digest;

        previous
    }

    /// Return a [Proof] of the value committed under `key` (or of its absence) against the
    /// current root.
    pub fn witness(&self, key: &H::Digest) -> Proof<H::Digest> {
        let key_bytes = key.as_ref();
        let siblings = (0..self.height)
            .map(|height| {
                self.nodes[height]
                    .get(&sibling(key_bytes, height))
                    .copied()
                    .unwrap_or(self.empty[height])
            })
            .collect();
        Proof { siblings }
    }
}
