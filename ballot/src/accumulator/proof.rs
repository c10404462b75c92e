//! Witnesses of membership (or absence) of a key in an [super::Accumulator].

use super::{bit, Standard};
use commonware_cryptography::{Digest, Hasher as CHasher};

/// The sibling digests along the path from a key's leaf to the root, ordered from the leaf
/// upward.
///
/// The same [Proof] authenticates both the value committed under a key and the absence of any
/// value: verification only differs in the leaf digest the path starts from. Because setting a key
/// only changes nodes on that key's own path, a [Proof] taken before the key is set remains valid
/// for the same key after it is set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Proof<D: Digest> {
    /// The digest of the sibling at each height, starting with the sibling of the leaf.
    pub siblings: Vec<D>,
}

impl<D: Digest> Proof<D> {
    /// Compute the root implied by this proof for `key` holding `value` (or nothing if `value` is
    /// `None`).
    ///
    /// Returns `None` if the proof does not have one sibling per bit of `key`.
    pub fn reconstruct<H: CHasher<Digest = D>>(
        &self,
        hasher: &mut H,
        key: &D,
        value: Option<&D>,
    ) -> Option<D> {
        let key_bytes = key.as_ref();
        if self.siblings.len() != key_bytes.len() * 8 {
            return None;
        }

        let mut standard = Standard::new(hasher);
        let mut digest = match value {
            Some(value) => standard.leaf_digest(key, value),
            None => standard.empty_digest(),
        };
        for (height, sibling) in self.siblings.iter().enumerate() {
            digest = if bit(key_bytes, height) {
                standard.node_digest(sibling, &digest)
            } else {
                standard.node_digest(&digest, sibling)
            };
        }
        Some(digest)
    }

    /// Return true if this proof shows `value` is committed under `key` in the tree with `root`.
    pub fn verify_inclusion<H: CHasher<Digest = D>>(
        &self,
        hasher: &mut H,
        key: &D,
        value: &D,
        root: &D,
    ) -> bool {
        self.reconstruct(hasher, key, Some(value)).as_ref() == Some(root)
    }

    /// Return true if this proof shows no value is committed under `key` in the tree with `root`.
    pub fn verify_exclusion<H: CHasher<Digest = D>>(
        &self,
        hasher: &mut H,
        key: &D,
        root: &D,
    ) -> bool {
        self.reconstruct(hasher, key, None).as_ref() == Some(root)
    }
}
