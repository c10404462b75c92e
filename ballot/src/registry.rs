//! The fixed roll of eligible voters and their weights.
//!
//! A [Registry] is built once from the final list of voters. Each voter is committed to an
//! [Accumulator] under the digest of its public key, and the resulting root is the commitment every
//! [crate::Vote] must be signed against. The registry never changes after construction, so it can
//! be shared (read-only) by any number of concurrent validators.

use crate::accumulator::{Accumulator, Proof};
use commonware_cryptography::{Hasher, PublicKey};
use commonware_utils::union_unique;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// Namespace used to derive the key of a voter.
const KEY_NAMESPACE: &[u8] = b"_BALLOT_VOTER_KEY";

/// Namespace used to derive the digest of a voter's data.
const DATA_NAMESPACE: &[u8] = b"_BALLOT_VOTER_DATA";

/// Errors that can occur when building a [Registry].
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("duplicate voter: {0}")]
    DuplicateVoter(String),
    #[error("voter has zero weight: {0}")]
    ZeroWeight(String),
    #[error("total weight overflows")]
    WeightOverflow,
    #[error("no voters")]
    Empty,
}

/// An eligible voter and its voting weight.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Voter<P: PublicKey> {
    pub public_key: P,
    pub weight: u64,
}

impl<P: PublicKey> Voter<P> {
    /// Derive the key a voter with `public_key` is committed under.
    pub fn key<H: Hasher>(hasher: &mut H, public_key: &P) -> H::Digest {
        hasher.update(&union_unique(KEY_NAMESPACE, public_key.as_ref()));
        hasher.finalize()
    }

    /// Derive the digest of the voter's data (the value committed under its key).
    pub fn digest<H: Hasher>(&self, hasher: &mut H) -> H::Digest {
        let mut message = Vec::with_capacity(self.public_key.as_ref().len() + 8);
        message.extend_from_slice(self.public_key.as_ref());
        message.extend_from_slice(&self.weight.to_be_bytes());
        hasher.update(&union_unique(DATA_NAMESPACE, &message));
        hasher.finalize()
    }
}

/// A voter as stored in the registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry<P: PublicKey, D> {
    /// Position of the voter in the list the registry was built from.
    pub index: usize,
    /// Key the voter is committed under.
    pub key: D,
    pub voter: Voter<P>,
    /// Value committed under `key`.
    pub digest: D,
}

/// Summary of the registry's commitment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Meta<D> {
    pub root: D,
    pub height: usize,
    pub leaf_count: usize,
}

/// A full dump of the registry for read-only inspection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Flat<P: PublicKey, D> {
    pub meta: Meta<D>,
    pub entries: Vec<Entry<P, D>>,
}

/// The roll of eligible voters.
pub struct Registry<P: PublicKey, H: Hasher> {
    accumulator: Accumulator<H>,

    // Full entries in insertion order, kept in sync with the accumulator.
    entries: Vec<Entry<P, H::Digest>>,

    // Position of each voter in `entries`.
    index: HashMap<P, usize>,

    total_weight: u64,
}

impl<P: PublicKey, H: Hasher> Registry<P, H> {
    /// Build a registry from `(public key, weight)` pairs.
    ///
    /// Voters must be unique, have a non-zero weight and a combined weight that fits in a `u64`
    /// (which bounds every tally counter derived from the registry).
    pub fn new(voters: impl IntoIterator<Item = (P, u64)>) -> Result<Self, Error> {
        let mut hasher = H::new();
        let mut accumulator = Accumulator::new();
        let mut entries = Vec::new();
        let mut index = HashMap::new();
        let mut total_weight = 0u64;
        for (public_key, weight) in voters {
            if index.contains_key(&public_key) {
                return Err(Error::DuplicateVoter(public_key.to_string()));
            }
            if weight == 0 {
                return Err(Error::ZeroWeight(public_key.to_string()));
            }
            total_weight = total_weight
                .checked_add(weight)
                .ok_or(Error::WeightOverflow)?;

            let key = Voter::key(&mut hasher, &public_key);
            let voter = Voter { public_key, weight };
            let digest = voter.digest(&mut hasher);
            accumulator.set(key, digest);
            index.insert(voter.public_key.clone(), entries.len());
            entries.push(Entry {
                index: entries.len(),
                key,
                voter,
                digest,
            });
        }
        if entries.is_empty() {
            return Err(Error::Empty);
        }
        debug!(
            voters = entries.len(),
            total_weight,
            root = %accumulator.root(),
            "built registry"
        );

        Ok(Self {
            accumulator,
            entries,
            index,
            total_weight,
        })
    }

    /// Return the commitment every vote must be signed against.
    pub fn root(&self) -> H::Digest {
        self.accumulator.root()
    }

    /// Return the number of voters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return whether the registry has no voters (never true for a constructed registry).
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return the combined weight of all voters.
    pub fn total_weight(&self) -> u64 {
        self.total_weight
    }

    /// Return the entry of `public_key`, if registered.
    pub fn get(&self, public_key: &P) -> Option<&Entry<P, H::Digest>> {
        self.index.get(public_key).map(|i| &self.entries[*i])
    }

    /// Return whether `public_key` is registered.
    pub fn is_eligible(&self, public_key: &P) -> bool {
        self.index.contains_key(public_key)
    }

    /// Return the weight of `public_key`, if registered.
    pub fn weight_of(&self, public_key: &P) -> Option<u64> {
        self.get(public_key).map(|entry| entry.voter.weight)
    }

    /// Return a [Proof] of the voter data committed for `public_key` (or of its absence).
    pub fn witness(&self, public_key: &P) -> Proof<H::Digest> {
        let key = match self.get(public_key) {
            Some(entry) => entry.key,
            None => Voter::key(&mut H::new(), public_key),
        };
        self.accumulator.witness(&key)
    }

    /// Return whether `public_key` is registered and a witness of its data verifies against the
    /// current root.
    pub fn verify_membership(&self, public_key: &P) -> bool {
        let Some(entry) = self.get(public_key) else {
            return false;
        };
        let proof = self.accumulator.witness(&entry.key);
        proof.verify_inclusion(&mut H::new(), &entry.key, &entry.digest, &self.root())
    }

    /// Dump all entries (in the order the registry was built from) with the registry's root,
    /// height and number of leaves.
    pub fn flat(&self) -> Flat<P, H::Digest> {
        Flat {
            meta: Meta {
                root: self.root(),
                height: self.accumulator.height(),
                leaf_count: self.accumulator.len(),
            },
            entries: self.entries.clone(),
        }
    }
}
