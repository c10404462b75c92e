//! Validate submitted votes.
//!
//! Validation is a pure function of the vote, the (immutable) [Registry] and the votes already
//! pending in a pool. Checks run in a fixed order and stop at the first failure, so a vote is
//! always rejected for the same reason:
//!
//! 1. The vote was signed against the registry's current root ([Error::StaleRegistry]).
//! 2. The voter is registered and its membership witness verifies ([Error::NotEligible]).
//! 3. The ballot is one-hot ([Error::InvalidBallotEncoding]).
//! 4. The signature covers `(yes, no, abstained, proposal, registry)` ([Error::BadSignature]).
//! 5. The voter has no pending vote on the same proposal ([Error::DuplicateInPool]).
//!
//! Whether a voter has already had a vote _applied_ is not checked here: see
//! [crate::transition::Builder].

use crate::{
    registry::Registry,
    types::{ProposalId, Vote},
};
use commonware_cryptography::{Hasher, PublicKey};
use std::collections::HashSet;
use thiserror::Error;

/// Reasons a vote may be rejected at submission.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Error {
    #[error("vote was signed against a stale registry")]
    StaleRegistry,
    #[error("voter is not eligible")]
    NotEligible,
    #[error("ballot must select exactly one option")]
    InvalidBallotEncoding,
    #[error("invalid signature")]
    BadSignature,
    #[error("voter already has a pending vote on this proposal")]
    DuplicateInPool,
    #[error("voting is closed")]
    VotingClosed,
}

/// Votes that have been admitted but not yet applied.
pub trait Pending<P: PublicKey> {
    /// Return whether `voter` has a pending vote on `proposal`.
    fn contains(&self, voter: &P, proposal: ProposalId) -> bool;
}

impl<P: PublicKey> Pending<P> for HashSet<(P, ProposalId)> {
    fn contains(&self, voter: &P, proposal: ProposalId) -> bool {
        HashSet::contains(self, &(voter.clone(), proposal))
    }
}

/// Run every check that does not depend on pending votes (1 through 4).
pub fn check<P: PublicKey, H: Hasher>(
    registry: &Registry<P, H>,
    namespace: &[u8],
    vote: &Vote<P, H::Digest>,
) -> Result<(), Error> {
    if vote.registry != registry.root() {
        return Err(Error::StaleRegistry);
    }
    if !registry.verify_membership(&vote.voter) {
        return Err(Error::NotEligible);
    }
    if vote.ballot.choice().is_none() {
        return Err(Error::InvalidBallotEncoding);
    }
    if !vote.verify(namespace) {
        return Err(Error::BadSignature);
    }
    Ok(())
}

/// Validate `vote` against `registry` and the votes in `pending`.
///
/// Validation has no side effects: the caller decides whether to admit the vote.
pub fn validate<P: PublicKey, H: Hasher>(
    registry: &Registry<P, H>,
    namespace: &[u8],
    vote: &Vote<P, H::Digest>,
    pending: &impl Pending<P>,
) -> Result<(), Error> {
    check(registry, namespace, vote)?;
    if pending.contains(&vote.voter, vote.proposal) {
        return Err(Error::DuplicateInPool);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        mocks::{self, NAMESPACE, PROPOSAL},
        types::{Ballot, Choice},
    };
    use test_case::test_case;

    #[test]
    fn test_validate_accepts() {
        let registry = mocks::registry(&[1, 1]);
        let pending = HashSet::new();
        for (seed, choice) in [(0, Choice::Yes), (1, Choice::Abstain)] {
            let vote = mocks::vote(seed, registry.root(), PROPOSAL, choice);
            assert_eq!(validate(&registry, NAMESPACE, &vote, &pending), Ok(()));
        }
    }

    #[test]
    fn test_validate_stale_registry() {
        let registry = mocks::registry(&[1, 1]);
        let stale = mocks::registry(&[1]);

        // The voter is eligible under the current roll, but signed against another.
        let vote = mocks::vote(0, stale.root(), PROPOSAL, Choice::Yes);
        assert_eq!(
            validate(&registry, NAMESPACE, &vote, &HashSet::new()),
            Err(Error::StaleRegistry)
        );
    }

    #[test]
    fn test_validate_not_eligible() {
        let registry = mocks::registry(&[1, 1]);
        let vote = mocks::vote(5, registry.root(), PROPOSAL, Choice::Yes);
        assert_eq!(
            validate(&registry, NAMESPACE, &vote, &HashSet::new()),
            Err(Error::NotEligible)
        );
    }

    #[test_case(Ballot { yes: 1, no: 1, abstained: 0 }; "yes and no")]
    #[test_case(Ballot { yes: 0, no: 1, abstained: 1 }; "no and abstained")]
    #[test_case(Ballot { yes: 1, no: 1, abstained: 1 }; "all")]
    #[test_case(Ballot { yes: 0, no: 0, abstained: 0 }; "none")]
    #[test_case(Ballot { yes: 2, no: 0, abstained: 0 }; "double")]
    #[test_case(Ballot { yes: u64::MAX, no: 1, abstained: 1 }; "sums to one when wrapped")]
    fn test_validate_invalid_ballot_encoding(ballot: Ballot) {
        let registry = mocks::registry(&[1]);

        // Correctly signed by an eligible voter.
        let vote = mocks::vote(0, registry.root(), PROPOSAL, ballot);
        assert!(vote.verify(NAMESPACE));
        assert_eq!(
            validate(&registry, NAMESPACE, &vote, &HashSet::new()),
            Err(Error::InvalidBallotEncoding)
        );
    }

    #[test]
    fn test_validate_bad_signature() {
        let registry = mocks::registry(&[1, 1]);

        // Signed by another voter.
        let mut vote = mocks::vote(1, registry.root(), PROPOSAL, Choice::Yes);
        vote.voter = mocks::voter(0);
        assert_eq!(
            validate(&registry, NAMESPACE, &vote, &HashSet::new()),
            Err(Error::BadSignature)
        );

        // Signed over a different choice.
        let mut vote = mocks::vote(0, registry.root(), PROPOSAL, Choice::Yes);
        vote.ballot = Choice::No.into();
        assert_eq!(
            validate(&registry, NAMESPACE, &vote, &HashSet::new()),
            Err(Error::BadSignature)
        );

        // Signed under a different namespace.
        let vote = mocks::vote(0, registry.root(), PROPOSAL, Choice::Yes);
        assert_eq!(
            validate(&registry, b"other", &vote, &HashSet::new()),
            Err(Error::BadSignature)
        );
    }

    #[test]
    fn test_validate_duplicate_in_pool() {
        let registry = mocks::registry(&[1, 1]);
        let mut pending = HashSet::new();
        pending.insert((mocks::voter(0), PROPOSAL));

        let vote = mocks::vote(0, registry.root(), PROPOSAL, Choice::No);
        assert_eq!(
            validate(&registry, NAMESPACE, &vote, &pending),
            Err(Error::DuplicateInPool)
        );

        // Pending votes on other proposals or by other voters do not conflict.
        let vote = mocks::vote(0, registry.root(), PROPOSAL + 1, Choice::No);
        assert_eq!(validate(&registry, NAMESPACE, &vote, &pending), Ok(()));
        let vote = mocks::vote(1, registry.root(), PROPOSAL, Choice::No);
        assert_eq!(validate(&registry, NAMESPACE, &vote, &pending), Ok(()));
    }

    #[test]
    fn test_validate_order() {
        let registry = mocks::registry(&[1]);
        let stale = mocks::registry(&[2]);

        let split = Ballot {
            yes: 1,
            no: 1,
            abstained: 0,
        };

        // A vote failing every check reports the first.
        let mut vote = mocks::vote(7, stale.root(), PROPOSAL, split);
        vote.proposal += 1;
        let mut pending = HashSet::new();
        pending.insert((mocks::voter(7), PROPOSAL + 1));
        assert_eq!(
            validate(&registry, NAMESPACE, &vote, &pending),
            Err(Error::StaleRegistry)
        );

        // Then the next, and so on.
        vote.registry = registry.root();
        assert_eq!(
            validate(&registry, NAMESPACE, &vote, &pending),
            Err(Error::NotEligible)
        );
        let mut vote = mocks::vote(0, registry.root(), PROPOSAL, split);
        vote.proposal += 1;
        pending.insert((mocks::voter(0), PROPOSAL + 1));
        assert_eq!(
            validate(&registry, NAMESPACE, &vote, &pending),
            Err(Error::InvalidBallotEncoding)
        );
        vote.ballot = Choice::Yes.into();
        assert_eq!(
            validate(&registry, NAMESPACE, &vote, &pending),
            Err(Error::BadSignature)
        );
        let vote = mocks::vote(0, registry.root(), PROPOSAL + 1, Choice::Yes);
        assert_eq!(
            validate(&registry, NAMESPACE, &vote, &pending),
            Err(Error::DuplicateInPool)
        );
    }
}
