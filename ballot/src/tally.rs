//! Recompute a tally directly from a set of votes.
//!
//! These reducers do not consult the nullifier set, so they are only meaningful over votes that
//! are already known to be valid and unique (for example, the votes of an applied [crate::Batch]).
//! Addition is commutative: the result does not depend on the order of `votes`.

use crate::types::{Tally, Vote};
use commonware_cryptography::{Digest, PublicKey};

/// Sum the ballots of `votes`.
///
/// Returns `None` if any counter overflows.
pub fn aggregate<'a, P, D>(votes: impl IntoIterator<Item = &'a Vote<P, D>>) -> Option<Tally>
where
    P: PublicKey,
    D: Digest,
{
    aggregate_weighted(votes, |_| Some(1))
}

/// Sum the ballots of `votes`, scaling each by the weight `weight` returns for its voter.
///
/// Returns `None` if `weight` returns `None` for any voter or if any counter overflows.
pub fn aggregate_weighted<'a, P, D>(
    votes: impl IntoIterator<Item = &'a Vote<P, D>>,
    weight: impl Fn(&P) -> Option<u64>,
) -> Option<Tally>
where
    P: PublicKey,
    D: Digest,
{
    let mut tally = Tally::default();
    for vote in votes {
        let weight = weight(&vote.voter)?;
        let ballot = &vote.ballot;
        tally.yes = tally.yes.checked_add(ballot.yes.checked_mul(weight)?)?;
        tally.no = tally.no.checked_add(ballot.no.checked_mul(weight)?)?;
        tally.abstained = tally
            .abstained
            .checked_add(ballot.abstained.checked_mul(weight)?)?;
    }
    Some(tally)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        mocks::{self, PROPOSAL},
        types::{Ballot, Choice},
    };

    #[test]
    fn test_aggregate() {
        let registry = mocks::registry(&[1, 2, 3, 4]);
        let root = registry.root();
        let votes = vec![
            mocks::vote(0, root, PROPOSAL, Choice::Yes),
            mocks::vote(1, root, PROPOSAL, Choice::No),
            mocks::vote(2, root, PROPOSAL, Choice::Yes),
            mocks::vote(3, root, PROPOSAL, Choice::Abstain),
        ];
        let tally = aggregate(&votes).unwrap();
        assert_eq!(
            tally,
            Tally {
                yes: 2,
                no: 1,
                abstained: 1
            }
        );

        // Order does not matter.
        assert_eq!(aggregate(votes.iter().rev()), Some(tally));

        let weighted = aggregate_weighted(&votes, |voter| registry.weight_of(voter)).unwrap();
        assert_eq!(
            weighted,
            Tally {
                yes: 4,
                no: 2,
                abstained: 4
            }
        );
    }

    #[test]
    fn test_aggregate_empty() {
        let votes: Vec<mocks::TestVote> = Vec::new();
        assert_eq!(aggregate(&votes), Some(Tally::default()));
    }

    #[test]
    fn test_aggregate_unknown_voter() {
        let registry = mocks::registry(&[1]);
        let votes = vec![mocks::vote(5, registry.root(), PROPOSAL, Choice::Yes)];
        assert_eq!(
            aggregate_weighted(&votes, |voter| registry.weight_of(voter)),
            None
        );
    }

    #[test]
    fn test_aggregate_overflow() {
        let registry = mocks::registry(&[1]);
        let huge = Ballot {
            yes: u64::MAX,
            no: 0,
            abstained: 0,
        };
        let votes = vec![
            mocks::vote(0, registry.root(), PROPOSAL, huge),
            mocks::vote(0, registry.root(), PROPOSAL, Choice::Yes),
        ];
        assert_eq!(aggregate(&votes), None);
        assert_eq!(aggregate_weighted(&votes[..1], |_| Some(2)), None);
    }
}
