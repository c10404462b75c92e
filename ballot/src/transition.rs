//! Apply votes to the nullifier set and tally, recording each step as a [Transition].
//!
//! # Overview
//!
//! The [Builder] consumes an ordered sequence of validated votes. For every vote, it derives the
//! voter's nullifier for the proposal and, if that nullifier is unused, marks it used and adds the
//! vote's contribution to the tally. Each applied vote emits one [Transition] capturing the
//! nullifier root and tally before and after the vote.
//!
//! Votes that cannot be applied (most importantly, a second vote by a voter that already voted)
//! are recorded in [Batch::skipped] with a [Conflict] and leave all state untouched. A conflict
//! never aborts the batch.
//!
//! # Chaining
//!
//! Transitions are emitted in application order, and the `after` values of each equal the
//! `before` values of the next. A verifier can therefore check a batch by checking every
//! transition on its own (see [Witness::verify]) and then checking adjacency (see
//! [verify_chain]).
//!
//! # Determinism
//!
//! Given the same starting nullifier set, tally and ordered votes, the [Builder] emits the same
//! transitions. When a voter has more than one vote in the sequence, the first applied wins.

use crate::{
    accumulator::Proof,
    config::Weighting,
    nullifier::Nullifiers,
    registry::Registry,
    types::{Change, Proposal, Tally, Transition, Vote},
};
use commonware_cryptography::{Digest, Hasher, PublicKey};
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Reasons a validated vote may not be applied.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Conflict {
    #[error("voter already voted on this proposal")]
    AlreadyVoted,
    #[error("vote is for a different proposal")]
    UnknownProposal,
    #[error("voter is not in the registry")]
    UnknownVoter,
    #[error("ballot must select exactly one option")]
    InvalidBallot,
    #[error("tally overflows")]
    TallyOverflow,
}

/// A vote that was not applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Skipped<P: PublicKey, D: Digest> {
    /// Position of the vote in the applied sequence.
    pub index: usize,
    pub vote: Vote<P, D>,
    pub reason: Conflict,
}

/// Proof that a [Transition] marked exactly its nullifier as used.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Witness<D: Digest> {
    /// The nullifier marked by the transition.
    pub nullifier: D,
    /// Siblings of `nullifier` (identical before and after the transition).
    pub proof: Proof<D>,
}

impl<D: Digest> Witness<D> {
    /// Verify that `nullifier` was unused under `transition.nullifier.before` and holds `marker`
    /// under `transition.nullifier.after`.
    ///
    /// Because both roots are reconstructed from the same siblings, no other nullifier changed.
    pub fn verify<H: Hasher<Digest = D>>(
        &self,
        hasher: &mut H,
        marker: &D,
        transition: &Transition<D>,
    ) -> bool {
        self.proof
            .verify_exclusion(hasher, &self.nullifier, &transition.nullifier.before)
            && self.proof.verify_inclusion(
                hasher,
                &self.nullifier,
                marker,
                &transition.nullifier.after,
            )
    }
}

/// The result of applying a sequence of votes.
#[derive(Clone, Debug)]
pub struct Batch<P: PublicKey, D: Digest> {
    /// One transition per applied vote, in application order.
    pub transitions: Vec<Transition<D>>,
    /// One witness per transition (`witnesses[i]` proves `transitions[i]`).
    pub witnesses: Vec<Witness<D>>,
    /// Votes that were not applied.
    pub skipped: Vec<Skipped<P, D>>,
    /// Nullifier root after the batch.
    pub root: D,
    /// Tally after the batch.
    pub tally: Tally,
}

impl<P: PublicKey, D: Digest> Batch<P, D> {
    /// Collapse the batch into a single [Transition] from the state before the first applied vote
    /// to the state after the last.
    ///
    /// Returns `None` if no vote was applied.
    pub fn summary(&self) -> Option<Transition<D>> {
        let first = self.transitions.first()?;
        let last = self.transitions.last()?;
        Some(Transition {
            registry: first.registry,
            nullifier: Change {
                before: first.nullifier.before,
                after: last.nullifier.after,
            },
            proposal: first.proposal,
            result: Change {
                before: first.result.before,
                after: last.result.after,
            },
        })
    }
}

/// Applies votes with exclusive access to a nullifier set and proposal.
pub struct Builder<'a, P: PublicKey, H: Hasher> {
    registry: &'a Registry<P, H>,
    weighting: Weighting,
}

impl<'a, P: PublicKey, H: Hasher> Builder<'a, P, H> {
    /// Create a new builder counting votes against `registry`.
    pub fn new(registry: &'a Registry<P, H>, weighting: Weighting) -> Self {
        Self {
            registry,
            weighting,
        }
    }

    /// Apply `votes` in order to `nullifiers` and the tally of `proposal`.
    ///
    /// Votes are assumed to have passed [crate::validator::validate]: signatures are not checked
    /// again.
    pub fn apply(
        &self,
        nullifiers: &mut Nullifiers<H>,
        proposal: &mut Proposal,
        votes: impl IntoIterator<Item = Vote<P, H::Digest>>,
    ) -> Batch<P, H::Digest> {
        let registry = self.registry.root();
        let mut transitions = Vec::new();
        let mut witnesses = Vec::new();
        let mut skipped = Vec::new();
        for (index, vote) in votes.into_iter().enumerate() {
            match self.step(nullifiers, proposal, registry, &vote) {
                Ok((transition, witness)) => {
                    trace!(
                        index,
                        voter = %vote.voter,
                        before = %transition.nullifier.before,
                        after = %transition.nullifier.after,
                        "applied vote"
                    );
                    transitions.push(transition);
                    witnesses.push(witness);
                }
                Err(reason) => {
                    warn!(
                        index,
                        voter = %vote.voter,
                        proposal = vote.proposal,
                        ?reason,
                        "skipped vote"
                    );
                    skipped.push(Skipped {
                        index,
                        vote,
                        reason,
                    });
                }
            }
        }

        let root = nullifiers.root();
        debug!(
            proposal = proposal.id,
            applied = transitions.len(),
            skipped = skipped.len(),
            root = %root,
            "applied batch"
        );
        Batch {
            transitions,
            witnesses,
            skipped,
            root,
            tally: proposal.tally,
        }
    }

    /// Apply a single vote, leaving all state untouched if it conflicts.
    fn step(
        &self,
        nullifiers: &mut Nullifiers<H>,
        proposal: &mut Proposal,
        registry: H::Digest,
        vote: &Vote<P, H::Digest>,
    ) -> Result<(Transition<H::Digest>, Witness<H::Digest>), Conflict> {
        if vote.proposal != proposal.id {
            return Err(Conflict::UnknownProposal);
        }
        let weight = self
            .registry
            .weight_of(&vote.voter)
            .ok_or(Conflict::UnknownVoter)?;
        let choice = vote.ballot.choice().ok_or(Conflict::InvalidBallot)?;
        let key = nullifiers.key(&vote.voter, vote.proposal);
        if nullifiers.contains(&key) {
            return Err(Conflict::AlreadyVoted);
        }
        let before = proposal.tally;
        let after = before
            .increment(choice, self.weighting.contribution(weight))
            .ok_or(Conflict::TallyOverflow)?;

        // The witness is identical before and after the insert.
        let proof = nullifiers.witness(&key);
        let root = nullifiers.root();
        nullifiers.insert(key);
        proposal.tally = after;
        Ok((
            Transition {
                registry,
                nullifier: Change {
                    before: root,
                    after: nullifiers.root(),
                },
                proposal: proposal.id,
                result: Change { before, after },
            },
            Witness {
                nullifier: key,
                proof,
            },
        ))
    }
}

/// Errors that can occur when verifying a chain of transitions.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainError {
    #[error("transition {0} references a different registry")]
    RegistryChanged(usize),
    #[error("transition {0} references a different proposal")]
    ProposalChanged(usize),
    #[error("transition {0} does not start at the previous nullifier root")]
    NullifierGap(usize),
    #[error("transition {0} does not start at the previous tally")]
    TallyGap(usize),
    #[error("transition {0} does not record exactly one vote")]
    InvalidStep(usize),
}

/// Returns whether `result` increments exactly one counter (and leaves the others unchanged).
fn single_increment(result: &Change<Tally>) -> bool {
    let (before, after) = (&result.before, &result.after);
    let increased = [
        (before.yes, after.yes),
        (before.no, after.no),
        (before.abstained, after.abstained),
    ];
    let mut changed = 0;
    for (before, after) in increased {
        if after < before {
            return false;
        }
        if after > before {
            changed += 1;
        }
    }
    changed == 1
}

/// Verify that `transitions` form a single chain.
///
/// Every transition must reference the same registry and proposal, start at the nullifier root
/// and tally the previous one ended at, change the nullifier root, and increment exactly one
/// counter. An empty chain is valid.
pub fn verify_chain<D: Digest>(transitions: &[Transition<D>]) -> Result<(), ChainError> {
    let Some(first) = transitions.first() else {
        return Ok(());
    };
    let mut previous: Option<&Transition<D>> = None;
    for (index, transition) in transitions.iter().enumerate() {
        if transition.registry != first.registry {
            return Err(ChainError::RegistryChanged(index));
        }
        if transition.proposal != first.proposal {
            return Err(ChainError::ProposalChanged(index));
        }
        if let Some(previous) = previous {
            if previous.nullifier.after != transition.nullifier.before {
                return Err(ChainError::NullifierGap(index));
            }
            if previous.result.after != transition.result.before {
                return Err(ChainError::TallyGap(index));
            }
        }
        if transition.nullifier.before == transition.nullifier.after
            || !single_increment(&transition.result)
        {
            return Err(ChainError::InvalidStep(index));
        }
        previous = Some(transition);
    }
    Ok(())
}
