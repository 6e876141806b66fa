use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{PrimitivesError, Result};

/// Opaque output of the external proving pipeline.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProofPayload {
    #[serde(default)]
    pub proof: Value,
    #[serde(default, rename = "publicOutput")]
    pub public_output: Value,
}

impl ProofPayload {
    /// Both halves must be present; neither is inspected beyond that.
    pub fn validate(&self) -> Result<()> {
        if self.proof.is_null() {
            return Err(PrimitivesError::InvalidInput("proof is missing".to_string()));
        }
        if self.public_output.is_null() {
            return Err(PrimitivesError::InvalidInput(
                "public output is missing".to_string(),
            ));
        }
        Ok(())
    }
}

/// Body of a ticket issuance request.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketSubmission {
    #[serde(default)]
    pub proof: Option<ProofPayload>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default)]
    pub is_inviting: Option<bool>,
}

/// Treats an explicit `null` the same as an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> core::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl TicketSubmission {
    pub fn is_inviting(&self) -> bool {
        self.is_inviting.unwrap_or(false)
    }
}
