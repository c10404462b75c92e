//! Types used in [ballot](crate).

use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error as CodecError, Read, ReadExt, Write};
use commonware_cryptography::{Digest, PublicKey, Signer};
use commonware_utils::union;
use std::ops::Range;

/// Identifier of a proposal being voted on.
pub type ProposalId = u64;

/// Suffix used to identify a vote namespace for domain separation.
///
/// Used when signing and verifying votes to prevent signature reuse across different message
/// types.
const VOTE_SUFFIX: &[u8] = b"_BALLOT_VOTE";

/// Returns a suffixed namespace for signing a vote.
#[inline]
pub fn vote_namespace(namespace: &[u8]) -> Vec<u8> {
    union(namespace, VOTE_SUFFIX)
}

/// One of the options a voter can choose.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Choice {
    Yes,
    No,
    Abstain,
}

/// The choice fields of a [Vote] as submitted.
///
/// A well-formed ballot is one-hot: exactly one field is 1 and the others are 0. Ballots are
/// received from untrusted signers, so nothing about this type enforces that (see
/// [Ballot::choice]).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Ballot {
    pub yes: u64,
    pub no: u64,
    pub abstained: u64,
}

impl Ballot {
    /// Return a one-hot ballot for `choice`.
    pub fn new(choice: Choice) -> Self {
        let mut ballot = Self::default();
        match choice {
            Choice::Yes => ballot.yes = 1,
            Choice::No => ballot.no = 1,
            Choice::Abstain => ballot.abstained = 1,
        }
        ballot
    }

    /// Return the selected [Choice] if (and only if) the ballot is one-hot.
    pub fn choice(&self) -> Option<Choice> {
        match (self.yes, self.no, self.abstained) {
            (1, 0, 0) => Some(Choice::Yes),
            (0, 1, 0) => Some(Choice::No),
            (0, 0, 1) => Some(Choice::Abstain),
            _ => None,
        }
    }
}

impl From<Choice> for Ballot {
    fn from(choice: Choice) -> Self {
        Self::new(choice)
    }
}

impl Write for Ballot {
    fn write(&self, buf: &mut impl BufMut) {
        self.yes.write(buf);
        self.no.write(buf);
        self.abstained.write(buf);
    }
}

impl Read for Ballot {
    type Cfg = ();

    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, CodecError> {
        let yes = u64::read(buf)?;
        let no = u64::read(buf)?;
        let abstained = u64::read(buf)?;
        Ok(Self { yes, no, abstained })
    }
}

impl EncodeSize for Ballot {
    fn encode_size(&self) -> usize {
        self.yes.encode_size() + self.no.encode_size() + self.abstained.encode_size()
    }
}

/// Running yes/no/abstained counters of a proposal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Tally {
    pub yes: u64,
    pub no: u64,
    pub abstained: u64,
}

impl Tally {
    /// Return the counter for `choice`.
    pub fn get(&self, choice: Choice) -> u64 {
        match choice {
            Choice::Yes => self.yes,
            Choice::No => self.no,
            Choice::Abstain => self.abstained,
        }
    }

    /// Return a copy of this tally with `amount` added to the counter for `choice`.
    ///
    /// Returns `None` on overflow.
    pub fn increment(&self, choice: Choice, amount: u64) -> Option<Self> {
        let mut next = *self;
        let counter = match choice {
            Choice::Yes => &mut next.yes,
            Choice::No => &mut next.no,
            Choice::Abstain => &mut next.abstained,
        };
        *counter = counter.checked_add(amount)?;
        Some(next)
    }

    /// Return the sum of all counters.
    ///
    /// Returns `None` on overflow.
    pub fn total(&self) -> Option<u64> {
        self.yes.checked_add(self.no)?.checked_add(self.abstained)
    }
}

impl Write for Tally {
    fn write(&self, buf: &mut impl BufMut) {
        self.yes.write(buf);
        self.no.write(buf);
        self.abstained.write(buf);
    }
}

impl Read for Tally {
    type Cfg = ();

    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, CodecError> {
        let yes = u64::read(buf)?;
        let no = u64::read(buf)?;
        let abstained = u64::read(buf)?;
        Ok(Self { yes, no, abstained })
    }
}

impl EncodeSize for Tally {
    fn encode_size(&self) -> usize {
        self.yes.encode_size() + self.no.encode_size() + self.abstained.encode_size()
    }
}

/// The proposal being voted on and its authoritative running tally.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Proposal {
    pub title: String,
    pub id: ProposalId,
    pub tally: Tally,
}

impl Proposal {
    /// Create a new proposal with an empty tally.
    pub fn new(title: impl Into<String>, id: ProposalId) -> Self {
        Self {
            title: title.into(),
            id,
            tally: Tally::default(),
        }
    }
}

/// A signed vote of `voter` on `proposal`.
///
/// `registry` is the root of the voter registry the vote was signed against. Binding the vote to
/// a root prevents it from being replayed against a different roll of voters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Vote<P: PublicKey, D: Digest> {
    pub voter: P,
    pub signature: P::Signature,
    pub registry: D,
    pub proposal: ProposalId,
    pub ballot: Ballot,
}

impl<P: PublicKey, D: Digest> Vote<P, D> {
    /// Returns the message covered by a vote's signature.
    ///
    /// The fields are written in the order `(yes, no, abstained, proposal, registry)`. Signers
    /// and verifiers must agree on this order.
    pub fn payload(ballot: &Ballot, proposal: ProposalId, registry: &D) -> Vec<u8> {
        let mut payload = Vec::with_capacity(ballot.encode_size() + 8 + registry.as_ref().len());
        payload.put_u64(ballot.yes);
        payload.put_u64(ballot.no);
        payload.put_u64(ballot.abstained);
        payload.put_u64(proposal);
        payload.put_slice(registry.as_ref());
        payload
    }

    /// Sign a vote for `ballot` on `proposal` against the registry with root `registry`.
    pub fn sign<S>(
        signer: &S,
        namespace: &[u8],
        registry: D,
        proposal: ProposalId,
        ballot: Ballot,
    ) -> Self
    where
        S: Signer<PublicKey = P, Signature = P::Signature>,
    {
        let payload = Self::payload(&ballot, proposal, &registry);
        let signature = signer.sign(Some(&vote_namespace(namespace)), &payload);
        Self {
            voter: signer.public_key(),
            signature,
            registry,
            proposal,
            ballot,
        }
    }

    /// Verify the signature of the vote under `namespace`.
    pub fn verify(&self, namespace: &[u8]) -> bool {
        let payload = Self::payload(&self.ballot, self.proposal, &self.registry);
        self.voter
            .verify(Some(&vote_namespace(namespace)), &payload, &self.signature)
    }
}

impl<P: PublicKey, D: Digest> Write for Vote<P, D> {
    fn write(&self, buf: &mut impl BufMut) {
        self.voter.write(buf);
        self.signature.write(buf);
        self.registry.write(buf);
        self.proposal.write(buf);
        self.ballot.write(buf);
    }
}

impl<P: PublicKey, D: Digest> Read for Vote<P, D> {
    type Cfg = ();

    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, CodecError> {
        let voter = P::read(buf)?;
        let signature = P::Signature::read(buf)?;
        let registry = D::read(buf)?;
        let proposal = u64::read(buf)?;
        let ballot = Ballot::read(buf)?;
        Ok(Self {
            voter,
            signature,
            registry,
            proposal,
            ballot,
        })
    }
}

impl<P: PublicKey, D: Digest> EncodeSize for Vote<P, D> {
    fn encode_size(&self) -> usize {
        self.voter.encode_size()
            + self.signature.encode_size()
            + self.registry.encode_size()
            + self.proposal.encode_size()
            + self.ballot.encode_size()
    }
}

/// A value before and after a change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Change<T> {
    pub before: T,
    pub after: T,
}

impl<T: Write> Write for Change<T> {
    fn write(&self, buf: &mut impl BufMut) {
        self.before.write(buf);
        self.after.write(buf);
    }
}

impl<T: Read<Cfg = ()>> Read for Change<T> {
    type Cfg = ();

    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, CodecError> {
        let before = T::read(buf)?;
        let after = T::read(buf)?;
        Ok(Self { before, after })
    }
}

impl<T: EncodeSize> EncodeSize for Change<T> {
    fn encode_size(&self) -> usize {
        self.before.encode_size() + self.after.encode_size()
    }
}

/// The effect of applying votes to the nullifier set and tally of a proposal.
///
/// Transitions emitted for consecutive votes chain together: the `after` values of one equal the
/// `before` values of the next.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Transition<D: Digest> {
    /// Root of the voter registry the votes were validated against (never changes).
    pub registry: D,
    /// Root of the nullifier set.
    pub nullifier: Change<D>,
    /// The proposal voted on.
    pub proposal: ProposalId,
    /// Tally of the proposal.
    pub result: Change<Tally>,
}

impl<D: Digest> Write for Transition<D> {
    fn write(&self, buf: &mut impl BufMut) {
        self.registry.write(buf);
        self.nullifier.write(buf);
        self.proposal.write(buf);
        self.result.write(buf);
    }
}

impl<D: Digest> Read for Transition<D> {
    type Cfg = ();

    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, CodecError> {
        let registry = D::read(buf)?;
        let nullifier = Change::<D>::read(buf)?;
        let proposal = u64::read(buf)?;
        let result = Change::<Tally>::read(buf)?;
        Ok(Self {
            registry,
            nullifier,
            proposal,
            result,
        })
    }
}

impl<D: Digest> EncodeSize for Transition<D> {
    fn encode_size(&self) -> usize {
        self.registry.encode_size()
            + self.nullifier.encode_size()
            + self.proposal.encode_size()
            + self.result.encode_size()
    }
}

/// The phase of a ballot at some point in time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// The election has not started.
    Pending,
    /// Votes are being accepted.
    Election,
    /// Votes are no longer accepted and the result may be tallied and challenged.
    Challenge,
    /// The challenge period has ended.
    Closed,
}

/// The time ranges (in caller-defined units, typically seconds or block heights) of a ballot.
///
/// The core never reads a clock: the scheduler owning a [Period] decides when to call
/// [Period::phase] and what to do with the result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Period {
    pub election: Range<u64>,
    pub challenge: Range<u64>,
}

impl Period {
    /// Return the [Phase] at `now`.
    ///
    /// Any time after the election ends and before the challenge period ends is considered part
    /// of [Phase::Challenge].
    pub fn phase(&self, now: u64) -> Phase {
        if now < self.election.start {
            Phase::Pending
        } else if now < self.election.end {
            Phase::Election
        } else if now < self.challenge.end {
            Phase::Challenge
        } else {
            Phase::Closed
        }
    }
}
