//! Deterministic ticket identities.
//!
//! A ticket id is a UUID whose 122 free bits come from a SHA-256 digest of the
//! proof's public output, so the same proof always resolves to the same ticket
//! without a separate lookup key. The version and variant bits are fixed to the
//! v4 layout so the id is indistinguishable in shape from a random UUID.

use std::fmt;
use std::str::FromStr;

use base64::{prelude::BASE64_STANDARD, Engine};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{PrimitivesError, Result};

/// Appended to the serialized public output when a ticket is issued on behalf of an invitee.
pub const INVITE_DISCRIMINATOR: &str = "ref";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(Uuid);

impl TicketId {
    /// Derive the ticket id bound to `public_output`.
    ///
    /// The output is serialized to JSON, suffixed with [`INVITE_DISCRIMINATOR`]
    /// when `is_inviting` is set, base64 encoded and hashed. The first 16 bytes
    /// of the digest become the UUID.
    pub fn derive(public_output: &Value, is_inviting: bool) -> Result<Self> {
        if public_output.is_null() {
            return Err(PrimitivesError::InvalidInput(
                "public output is missing".to_string(),
            ));
        }

        let mut serialized = serde_json::to_string(public_output)
            .map_err(|e| PrimitivesError::SerializationError(e.to_string()))?;
        if is_inviting {
            serialized.push_str(INVITE_DISCRIMINATOR);
        }

        let encoded = BASE64_STANDARD.encode(serialized.as_bytes());
        let digest = Sha256::digest(encoded.as_bytes());

        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest[..16]);
        Ok(Self(uuid::Builder::from_random_bytes(bytes).into_uuid()))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for TicketId {
    type Err = PrimitivesError;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| PrimitivesError::InvalidTicketId(format!("{s}: {e}")))
    }
}
