//! Aggregate signed votes into a chain of verifiable state transitions.
//!
//! # Overview
//!
//! A ballot collects votes on a [Proposal] from a fixed [Registry] of eligible voters. Each voter
//! may vote on a proposal at most once: when a vote is applied, a nullifier derived from the voter
//! and proposal is committed to an [accumulator::Accumulator], and any later vote that derives the
//! same nullifier is skipped.
//!
//! Votes flow through the crate in three steps:
//!
//! 1. [validator::validate] checks a submitted [Vote] against the registry (root, eligibility,
//!    one-hot ballot, signature) and the votes already pending.
//! 2. [Pool] stages valid votes in submission order until the tally.
//! 3. [transition::Builder] applies the staged votes to the nullifier set and tally, emitting one
//!    [Transition] per applied vote. Consecutive transitions chain: the nullifier root and tally
//!    after one are the nullifier root and tally before the next.
//!
//! [Session] ties these together for a single proposal.
//!
//! # Example
//!
//! ```rust
//! use commonware_ballot::{Choice, Config, Period, Proposal, Registry, Session, Vote, Weighting};
//! use commonware_cryptography::{ed25519, PrivateKeyExt, Sha256, Signer};
//! use std::sync::Arc;
//!
//! let alice = ed25519::PrivateKey::from_seed(0);
//! let bob = ed25519::PrivateKey::from_seed(1);
//! let registry = Registry::<_, Sha256>::new([(alice.public_key(), 1), (bob.public_key(), 1)])
//!     .expect("valid registry");
//! let root = registry.root();
//!
//! let namespace = b"_MY_BALLOT";
//! let mut session = Session::new(
//!     Config { namespace: namespace.to_vec(), weighting: Weighting::Unit },
//!     Arc::new(registry),
//!     Proposal::new("upgrade", 1),
//!     Period { election: 0..100, challenge: 100..200 },
//!     0,
//! );
//!
//! let vote = Vote::sign(&alice, namespace, root, 1, Choice::Yes.into());
//! session.submit(vote).expect("valid vote");
//! session.close();
//!
//! let batch = session.tally();
//! assert_eq!(batch.transitions.len(), 1);
//! assert_eq!(session.proposal().tally.yes, 1);
//! ```
//!
//! # Status
//!
//! `commonware-ballot` is **ALPHA** software and is not yet recommended for production use. Developers should
//! expect breaking changes and occasional instability.

pub mod accumulator;
pub mod config;
pub mod json;
pub mod nullifier;
pub mod pool;
pub mod registry;
pub mod session;
pub mod tally;
pub mod transition;
pub mod types;
pub mod validator;

#[cfg(test)]
pub(crate) mod mocks;

pub use config::{Config, Weighting};
pub use nullifier::Nullifiers;
pub use pool::{Pool, Rejected};
pub use registry::Registry;
pub use session::Session;
pub use transition::{Batch, Builder};
pub use types::{Ballot, Choice, Period, Phase, Proposal, ProposalId, Tally, Transition, Vote};
