//! Decode votes submitted as JSON.
//!
//! Decoding is strict: unknown or missing fields are rejected, and every key, signature and root
//! must be the hex encoding of a well-formed value. Errors name the offending field so a
//! transport can report them to the submitter verbatim.
//!
//! ```json
//! {
//!   "voter": "<hex public key>",
//!   "authorization": "<hex signature>",
//!   "voterDataRoot": "<hex registry root>",
//!   "proposalId": 1,
//!   "yes": 1,
//!   "no": 0,
//!   "abstained": 0
//! }
//! ```

use crate::types::{Ballot, ProposalId, Vote};
use commonware_codec::{Encode, Read, ReadExt};
use commonware_cryptography::{Digest, PublicKey};
use commonware_utils::{from_hex, hex};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when decoding a vote.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("malformed vote: {0}")]
    Malformed(String),
    #[error("invalid {field}: {reason}")]
    Field {
        field: &'static str,
        reason: &'static str,
    },
}

/// The JSON representation of a [Vote].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JsonVote {
    pub voter: String,
    pub authorization: String,
    pub voter_data_root: String,
    pub proposal_id: ProposalId,
    pub yes: u64,
    pub no: u64,
    pub abstained: u64,
}

fn decode_hex<T: Read<Cfg = ()>>(field: &'static str, value: &str) -> Result<T, Error> {
    let invalid = Error::Field {
        field,
        reason: "wrong length or invalid encoding",
    };
    let bytes = from_hex(value).ok_or(Error::Field {
        field,
        reason: "not hex",
    })?;
    let mut buf = bytes.as_slice();
    let decoded = T::read(&mut buf).map_err(|_| invalid.clone())?;
    if !buf.is_empty() {
        return Err(invalid);
    }
    Ok(decoded)
}

impl JsonVote {
    /// Encode `vote`.
    pub fn from_vote<P: PublicKey, D: Digest>(vote: &Vote<P, D>) -> Self {
        Self {
            voter: hex(&vote.voter.encode()),
            authorization: hex(&vote.signature.encode()),
            voter_data_root: hex(&vote.registry.encode()),
            proposal_id: vote.proposal,
            yes: vote.ballot.yes,
            no: vote.ballot.no,
            abstained: vote.ballot.abstained,
        }
    }

    /// Decode into a [Vote].
    ///
    /// The ballot is not checked for one-hot encoding here: that is a validation rule (see
    /// [crate::validator]) reported with its own reason.
    pub fn into_vote<P: PublicKey, D: Digest>(self) -> Result<Vote<P, D>, Error> {
        Ok(Vote {
            voter: decode_hex("voter", &self.voter)?,
            signature: decode_hex("authorization", &self.authorization)?,
            registry: decode_hex("voterDataRoot", &self.voter_data_root)?,
            proposal: self.proposal_id,
            ballot: Ballot {
                yes: self.yes,
                no: self.no,
                abstained: self.abstained,
            },
        })
    }
}

/// Parse a vote from its JSON representation.
pub fn parse<P: PublicKey, D: Digest>(input: &str) -> Result<Vote<P, D>, Error> {
    let json: JsonVote =
        serde_json::from_str(input).map_err(|err| Error::Malformed(err.to_string()))?;
    json.into_vote()
}

/// Render a vote as JSON.
pub fn render<P: PublicKey, D: Digest>(vote: &Vote<P, D>) -> String {
    // Every field is a string or integer, so serialization cannot fail.
    serde_json::to_string(&JsonVote::from_vote(vote)).unwrap_or_default()
}
