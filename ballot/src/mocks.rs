//! Deterministic fixtures for testing.

use crate::{
    registry::Registry,
    types::{Ballot, ProposalId, Vote},
};
use commonware_cryptography::{
    ed25519::{PrivateKey, PublicKey},
    sha256::Digest,
    PrivateKeyExt, Sha256, Signer,
};

/// Namespace votes are signed under in tests.
pub const NAMESPACE: &[u8] = b"_COMMONWARE_BALLOT_TEST";

/// Proposal voted on in tests.
pub const PROPOSAL: ProposalId = 1;

/// A vote signed with ed25519 over a SHA-256 registry root.
pub type TestVote = Vote<PublicKey, Digest>;

/// A registry of ed25519 voters committed with SHA-256.
pub type TestRegistry = Registry<PublicKey, Sha256>;

/// Return the signer derived from `seed`.
pub fn signer(seed: u64) -> PrivateKey {
    PrivateKey::from_seed(seed)
}

/// Return the public key derived from `seed`.
pub fn voter(seed: u64) -> PublicKey {
    signer(seed).public_key()
}

/// Return a registry where the voter derived from seed `i` has weight `weights[i]`.
pub fn registry(weights: &[u64]) -> TestRegistry {
    Registry::new(
        weights
            .iter()
            .enumerate()
            .map(|(seed, weight)| (voter(seed as u64), *weight)),
    )
    .expect("valid registry")
}

/// Return a vote by the voter derived from `seed`, correctly signed under [NAMESPACE].
pub fn vote(
    seed: u64,
    registry: Digest,
    proposal: ProposalId,
    ballot: impl Into<Ballot>,
) -> TestVote {
    Vote::sign(&signer(seed), NAMESPACE, registry, proposal, ballot.into())
}
