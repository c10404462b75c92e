//! Drive a single proposal from submission to tally.
//!
//! A [Session] owns everything a ballot mutates: the [Pool] of pending votes, the nullifier set,
//! the proposal's tally and the append-only log of [Transition]s. Submission takes `&self` and may
//! be called concurrently from any number of threads. Tallying takes `&mut self`, so the borrow
//! checker guarantees a single writer applies votes at a time.
//!
//! The session never reads a clock. The scheduler owning the session decides when to call
//! [Session::sync] (or [Session::close]) and [Session::tally].

use crate::{
    config::Config,
    nullifier::Nullifiers,
    pool::{Pool, Rejected},
    registry::Registry,
    transition::{Batch, Builder},
    types::{Period, Phase, Proposal, Transition, Vote},
};
use commonware_cryptography::{Hasher, PublicKey};
use std::sync::Arc;
use tracing::debug;

/// The state of a ballot on one proposal.
pub struct Session<P: PublicKey, H: Hasher> {
    config: Config,
    period: Period,
    registry: Arc<Registry<P, H>>,

    pool: Pool<P, H::Digest>,

    proposal: Proposal,
    nullifiers: Nullifiers<H>,
    transitions: Vec<Transition<H::Digest>>,
}

impl<P: PublicKey, H: Hasher> Session<P, H> {
    /// Create a new session on `proposal`.
    ///
    /// Submission starts open only if `now` falls in the election window (see [Session::sync]).
    pub fn new(
        config: Config,
        registry: Arc<Registry<P, H>>,
        proposal: Proposal,
        period: Period,
        now: u64,
    ) -> Self {
        let session = Self {
            config,
            period,
            registry,
            pool: Pool::new(),
            proposal,
            nullifiers: Nullifiers::new(),
            transitions: Vec::new(),
        };
        session.sync(now);
        session
    }

    /// Validate `vote` and, if valid, stage it for the next tally.
    pub fn submit(&self, vote: Vote<P, H::Digest>) -> Result<(), Rejected<P, H::Digest>> {
        self.pool
            .try_admit(&*self.registry, &self.config.namespace, vote)
    }

    /// Open or close submission based on the [Phase] of the voting period at `now`.
    ///
    /// Submission is only open during [Phase::Election].
    pub fn sync(&self, now: u64) -> Phase {
        let phase = self.period.phase(now);
        match phase {
            Phase::Election => self.pool.open(),
            Phase::Pending | Phase::Challenge | Phase::Closed => self.pool.close(),
        }
        phase
    }

    /// Start accepting votes.
    pub fn open(&self) {
        self.pool.open();
    }

    /// Stop accepting votes.
    pub fn close(&self) {
        self.pool.close();
    }

    /// Return whether votes are being accepted.
    pub fn is_open(&self) -> bool {
        self.pool.is_open()
    }

    /// Drain all pending votes and apply them.
    ///
    /// The emitted transitions are appended to [Session::transitions].
    pub fn tally(&mut self) -> Batch<P, H::Digest> {
        let votes = self.pool.drain();
        let builder = Builder::new(&*self.registry, self.config.weighting);
        let batch = builder.apply(&mut self.nullifiers, &mut self.proposal, votes);
        self.transitions.extend_from_slice(&batch.transitions);
        debug!(
            proposal = self.proposal.id,
            transitions = self.transitions.len(),
            yes = self.proposal.tally.yes,
            no = self.proposal.tally.no,
            abstained = self.proposal.tally.abstained,
            "tallied"
        );
        batch
    }

    /// Return every transition applied in this session, in order.
    pub fn transitions(&self) -> &[Transition<H::Digest>] {
        &self.transitions
    }

    /// Return the proposal (and its current tally).
    pub fn proposal(&self) -> &Proposal {
        &self.proposal
    }

    /// Return the registry votes are validated against.
    pub fn registry(&self) -> &Arc<Registry<P, H>> {
        &self.registry
    }

    /// Return the current nullifier root.
    pub fn nullifier_root(&self) -> H::Digest {
        self.nullifiers.root()
    }

    /// Return the number of votes awaiting the next tally.
    pub fn pending(&self) -> usize {
        self.pool.size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Weighting,
        mocks::{self, TestRegistry, NAMESPACE, PROPOSAL},
        transition::{verify_chain, Conflict},
        types::{Choice, Tally},
        validator::Error,
    };
    use commonware_cryptography::{ed25519::PublicKey, Sha256};
    use commonware_macros::test_traced;
    use std::thread;

    fn period() -> Period {
        Period {
            election: 10..20,
            challenge: 20..30,
        }
    }

    fn session(registry: TestRegistry, weighting: Weighting) -> Session<PublicKey, Sha256> {
        Session::new(
            Config {
                namespace: NAMESPACE.to_vec(),
                weighting,
            },
            Arc::new(registry),
            Proposal::new("test", PROPOSAL),
            period(),
            10,
        )
    }

    #[test_traced]
    fn test_session_end_to_end() {
        let mut session = session(mocks::registry(&[1, 1]), Weighting::Unit);
        let root = session.registry().root();
        let empty = session.nullifier_root();

        // A votes yes.
        session
            .submit(mocks::vote(0, root, PROPOSAL, Choice::Yes))
            .unwrap();
        assert_eq!(session.pending(), 1);
        let batch = session.tally();
        assert_eq!(
            session.proposal().tally,
            Tally {
                yes: 1,
                no: 0,
                abstained: 0
            }
        );
        assert_eq!(batch.transitions.len(), 1);
        let transition = batch.transitions[0];
        assert_eq!(transition.result.before, Tally::default());
        assert_eq!(transition.result.after, session.proposal().tally);
        assert_eq!(transition.nullifier.before, empty);
        assert_eq!(transition.nullifier.after, session.nullifier_root());

        // B votes no.
        session
            .submit(mocks::vote(1, root, PROPOSAL, Choice::No))
            .unwrap();
        session.tally();
        assert_eq!(
            session.proposal().tally,
            Tally {
                yes: 1,
                no: 1,
                abstained: 0
            }
        );

        // A votes again: admitted to the (drained) pool, but not applied.
        session
            .submit(mocks::vote(0, root, PROPOSAL, Choice::No))
            .unwrap();
        let rejected = session
            .submit(mocks::vote(0, root, PROPOSAL, Choice::Abstain))
            .unwrap_err();
        assert_eq!(rejected.reason, Error::DuplicateInPool);
        let batch = session.tally();
        assert!(batch.transitions.is_empty());
        assert_eq!(batch.skipped.len(), 1);
        assert_eq!(batch.skipped[0].reason, Conflict::AlreadyVoted);
        assert_eq!(
            session.proposal().tally,
            Tally {
                yes: 1,
                no: 1,
                abstained: 0
            }
        );

        // The log chains across tallies.
        assert_eq!(session.transitions().len(), 2);
        assert_eq!(verify_chain(session.transitions()), Ok(()));
    }

    #[test_traced]
    fn test_session_sync() {
        let session = session(mocks::registry(&[1, 1]), Weighting::Unit);
        let root = session.registry().root();

        assert_eq!(session.sync(5), Phase::Pending);
        assert!(!session.is_open());
        let rejected = session
            .submit(mocks::vote(0, root, PROPOSAL, Choice::Yes))
            .unwrap_err();
        assert_eq!(rejected.reason, Error::VotingClosed);

        assert_eq!(session.sync(10), Phase::Election);
        assert!(session.is_open());
        session
            .submit(mocks::vote(0, root, PROPOSAL, Choice::Yes))
            .unwrap();

        assert_eq!(session.sync(20), Phase::Challenge);
        assert!(!session.is_open());
        let rejected = session
            .submit(mocks::vote(1, root, PROPOSAL, Choice::Yes))
            .unwrap_err();
        assert_eq!(rejected.reason, Error::VotingClosed);
        assert_eq!(session.pending(), 1);

        assert_eq!(session.sync(30), Phase::Closed);
        assert!(!session.is_open());
    }

    #[test]
    fn test_session_starts_closed_outside_election() {
        let config = Config {
            namespace: NAMESPACE.to_vec(),
            weighting: Weighting::Unit,
        };
        let registry = Arc::new(mocks::registry(&[1]));
        let root = registry.root();

        // Created before the election opens.
        let early: Session<PublicKey, Sha256> = Session::new(
            config.clone(),
            registry.clone(),
            Proposal::new("test", PROPOSAL),
            period(),
            0,
        );
        assert!(!early.is_open());
        let rejected = early
            .submit(mocks::vote(0, root, PROPOSAL, Choice::Yes))
            .unwrap_err();
        assert_eq!(rejected.reason, Error::VotingClosed);
        assert_eq!(early.pending(), 0);

        // Created after it ends.
        let late: Session<PublicKey, Sha256> = Session::new(
            config,
            registry,
            Proposal::new("test", PROPOSAL),
            period(),
            25,
        );
        assert!(!late.is_open());

        // Opens once the scheduler reaches the election window.
        assert_eq!(early.sync(15), Phase::Election);
        early
            .submit(mocks::vote(0, root, PROPOSAL, Choice::Yes))
            .unwrap();
    }

    #[test]
    fn test_session_weighted() {
        let mut session = session(mocks::registry(&[2, 7]), Weighting::Weighted);
        let root = session.registry().root();
        session
            .submit(mocks::vote(0, root, PROPOSAL, Choice::Abstain))
            .unwrap();
        session
            .submit(mocks::vote(1, root, PROPOSAL, Choice::Yes))
            .unwrap();
        session.close();
        session.tally();
        assert_eq!(
            session.proposal().tally,
            Tally {
                yes: 7,
                no: 0,
                abstained: 2
            }
        );
    }

    #[test]
    fn test_session_concurrent_submit() {
        let mut session = session(mocks::registry(&[1; 16]), Weighting::Unit);
        let root = session.registry().root();
        thread::scope(|s| {
            for seed in 0..16u64 {
                let session = &session;
                s.spawn(move || {
                    let choice = match seed % 3 {
                        0 => Choice::Yes,
                        1 => Choice::No,
                        _ => Choice::Abstain,
                    };
                    session
                        .submit(mocks::vote(seed, root, PROPOSAL, choice))
                        .unwrap();
                });
            }
        });
        assert_eq!(session.pending(), 16);
        let batch = session.tally();
        assert_eq!(batch.transitions.len(), 16);
        assert_eq!(
            session.proposal().tally,
            Tally {
                yes: 6,
                no: 5,
                abstained: 5
            }
        );
        assert_eq!(verify_chain(session.transitions()), Ok(()));
    }
}
