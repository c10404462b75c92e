//! Track which voters have had a vote applied to a proposal.
//!
//! A nullifier is a one-way digest of a voter's public key and a proposal. Committing it to an
//! [Accumulator] marks "this voter has voted on this proposal" without the marker revealing how
//! they voted.

use crate::{
    accumulator::{Accumulator, Proof},
    types::ProposalId,
};
use commonware_cryptography::{Hasher, PublicKey};
use commonware_utils::union_unique;

/// Namespace used to derive a nullifier from a voter and proposal.
const NULLIFIER_NAMESPACE: &[u8] = b"_BALLOT_NULLIFIER";

/// Namespace used to derive the value committed under a nullifier.
const NULLIFIED_NAMESPACE: &[u8] = b"_BALLOT_NULLIFIED";

/// Derive the nullifier of `voter` for `proposal`.
pub fn nullifier<P: PublicKey, H: Hasher>(
    hasher: &mut H,
    voter: &P,
    proposal: ProposalId,
) -> H::Digest {
    let mut message = Vec::with_capacity(voter.as_ref().len() + 8);
    message.extend_from_slice(voter.as_ref());
    message.extend_from_slice(&proposal.to_be_bytes());
    hasher.update(&union_unique(NULLIFIER_NAMESPACE, &message));
    hasher.finalize()
}

/// Derive the value committed under a used nullifier.
pub fn nullified<H: Hasher>(hasher: &mut H) -> H::Digest {
    hasher.update(&union_unique(NULLIFIED_NAMESPACE, &1u64.to_be_bytes()));
    hasher.finalize()
}

/// The set of used nullifiers.
///
/// A nullifier is either absent or committed with the [nullified] marker, and is committed at
/// most once.
pub struct Nullifiers<H: Hasher> {
    hasher: H,
    accumulator: Accumulator<H>,
    marker: H::Digest,
}

impl<H: Hasher> Default for Nullifiers<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Hasher> Nullifiers<H> {
    /// Return a new (empty) set.
    pub fn new() -> Self {
        let mut hasher = H::new();
        let marker = nullified(&mut hasher);
        Self {
            hasher,
            accumulator: Accumulator::new(),
            marker,
        }
    }

    /// Derive the nullifier of `voter` for `proposal`.
    pub fn key<P: PublicKey>(&mut self, voter: &P, proposal: ProposalId) -> H::Digest {
        nullifier(&mut self.hasher, voter, proposal)
    }

    /// Return the value committed under every used nullifier.
    pub fn marker(&self) -> H::Digest {
        self.marker
    }

    /// Return whether `key` has been used.
    pub fn contains(&self, key: &H::Digest) -> bool {
        self.accumulator.get(key) == Some(self.marker)
    }

    /// Mark `key` as used.
    ///
    /// Returns `false` (and leaves the set unchanged) if `key` was already used.
    pub fn insert(&mut self, key: H::Digest) -> bool {
        if self.contains(&key) {
            return false;
        }
        self.accumulator.set(key, self.marker);
        true
    }

    /// Return the current root.
    pub fn root(&self) -> H::Digest {
        self.accumulator.root()
    }

    /// Return a [Proof] that `key` is used (or unused) against the current root.
    pub fn witness(&self, key: &H::Digest) -> Proof<H::Digest> {
        self.accumulator.witness(key)
    }

    /// Return the number of used nullifiers.
    pub fn len(&self) -> usize {
        self.accumulator.len()
    }

    /// Return whether no nullifier has been used.
    pub fn is_empty(&self) -> bool {
        self.accumulator.is_empty()
    }
}
