//! Stage validated votes until they are applied.
//!
//! A [Pool] holds votes that passed validation but have not yet been applied, in the order they
//! were admitted. It is shared by concurrent submitters: every method takes `&self`, and
//! admission runs the duplicate check and the append in a single critical section so two votes
//! by the same voter on the same proposal can never both be admitted.
//!
//! Votes are only admitted while the pool is open. Closing the pool is a hard cutover: once
//! [Pool::close] returns, every subsequent [Pool::try_admit] fails with
//! [Error::VotingClosed] regardless of the vote.

use crate::{
    registry::Registry,
    types::{ProposalId, Vote},
    validator::{self, Error, Pending},
};
use commonware_cryptography::{Digest, Hasher, PublicKey};
use std::{collections::HashSet, mem, sync::Mutex};
use thiserror::Error as ThisError;
use tracing::debug;

/// A vote that was not admitted, echoed back to the submitter with the reason.
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
#[error("vote rejected: {reason}")]
pub struct Rejected<P: PublicKey, D: Digest> {
    pub reason: Error,
    pub vote: Vote<P, D>,
}

struct Inner<P: PublicKey, D: Digest> {
    votes: Vec<Vote<P, D>>,
    keys: HashSet<(P, ProposalId)>,
    open: bool,
}

/// Insertion-ordered votes awaiting application, at most one per voter and proposal.
pub struct Pool<P: PublicKey, D: Digest> {
    inner: Mutex<Inner<P, D>>,
}

impl<P: PublicKey, D: Digest> Default for Pool<P, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: PublicKey, D: Digest> Pool<P, D> {
    /// Create a new (open and empty) pool.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                votes: Vec::new(),
                keys: HashSet::new(),
                open: true,
            }),
        }
    }

    /// Validate `vote` and, if it is valid, append it to the pool.
    ///
    /// Checks that only read `registry` run outside the lock, so submissions of different votes
    /// proceed in parallel.
    pub fn try_admit<H: Hasher<Digest = D>>(
        &self,
        registry: &Registry<P, H>,
        namespace: &[u8],
        vote: Vote<P, D>,
    ) -> Result<(), Rejected<P, D>> {
        if !self.is_open() {
            return Err(Rejected {
                reason: Error::VotingClosed,
                vote,
            });
        }
        if let Err(reason) = validator::check(registry, namespace, &vote) {
            debug!(voter = %vote.voter, proposal = vote.proposal, ?reason, "rejected vote");
            return Err(Rejected { reason, vote });
        }

        let mut inner = self.inner.lock().unwrap();
        if !inner.open {
            return Err(Rejected {
                reason: Error::VotingClosed,
                vote,
            });
        }
        if Pending::contains(&inner.keys, &vote.voter, vote.proposal) {
            debug!(voter = %vote.voter, proposal = vote.proposal, "duplicate vote");
            return Err(Rejected {
                reason: Error::DuplicateInPool,
                vote,
            });
        }
        inner.keys.insert((vote.voter.clone(), vote.proposal));
        debug!(
            voter = %vote.voter,
            proposal = vote.proposal,
            pending = inner.votes.len() + 1,
            "admitted vote"
        );
        inner.votes.push(vote);
        Ok(())
    }

    /// Remove and return all pooled votes in the order they were admitted.
    ///
    /// Draining does not reopen or close the pool.
    pub fn drain(&self) -> Vec<Vote<P, D>> {
        let mut inner = self.inner.lock().unwrap();
        inner.keys.clear();
        let votes = mem::take(&mut inner.votes);
        debug!(votes = votes.len(), "drained pool");
        votes
    }

    /// Return the number of pooled votes.
    pub fn size(&self) -> usize {
        self.inner.lock().unwrap().votes.len()
    }

    /// Return whether `voter` has a pooled vote on `proposal`.
    pub fn contains(&self, voter: &P, proposal: ProposalId) -> bool {
        let inner = self.inner.lock().unwrap();
        Pending::contains(&inner.keys, voter, proposal)
    }

    /// Start accepting votes.
    pub fn open(&self) {
        let mut inner = self.inner.lock().unwrap();
        if !inner.open {
            inner.open = true;
            debug!("opened pool");
        }
    }

    /// Stop accepting votes.
    pub fn close(&self) {
        let mut inner = self.inner.lock().unwrap();
        if inner.open {
            inner.open = false;
            debug!(pending = inner.votes.len(), "closed pool");
        }
    }

    /// Return whether votes are being accepted.
    pub fn is_open(&self) -> bool {
        self.inner.lock().unwrap().open
    }
}

impl<P: PublicKey, D: Digest> Pending<P> for Pool<P, D> {
    fn contains(&self, voter: &P, proposal: ProposalId) -> bool {
        Pool::contains(self, voter, proposal)
    }
}
