//! Request-level ticket issuance.
//!
//! One call walks a submission through
//! `derive id -> existence check -> verify -> envelope -> sign -> insert`.
//! A ticket id already in the ledger ends the walk early as
//! [`IssuanceOutcome::AlreadyIssued`], and so does losing the insert race to a
//! concurrent submission of the same proof.

use std::sync::Arc;

use devcoff_primitives::{TicketId, TicketSubmission};
use devcoff_verifier::{ProofVerifier, VerifierError};
use thiserror::Error;
use url::Url;

use crate::credential::{CredentialError, CredentialIssuer};
use crate::ledger::{LedgerError, TicketLedger};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IssuanceOutcome {
    Issued { ticket_id: TicketId, claim_url: Url },
    AlreadyIssued { ticket_id: TicketId },
}

impl IssuanceOutcome {
    pub fn ticket_id(&self) -> TicketId {
        match self {
            Self::Issued { ticket_id, .. } | Self::AlreadyIssued { ticket_id } => *ticket_id,
        }
    }
}

#[derive(Error, Debug)]
pub enum IssuanceError {
    #[error("Invalid submission: {0}")]
    InvalidInput(String),
    #[error("Proof for ticket {0} failed verification")]
    InvalidProof(TicketId),
    #[error("Verifier error: {0}")]
    VerifierError(#[from] VerifierError),
    #[error("Ledger error: {0}")]
    LedgerError(#[from] LedgerError),
    #[error("Credential error: {0}")]
    CredentialError(#[from] CredentialError),
}

pub type Result<T> = core::result::Result<T, IssuanceError>;

#[derive(Clone)]
pub struct TicketIssuer {
    ledger: Arc<dyn TicketLedger>,
    verifier: Arc<dyn ProofVerifier>,
    credentials: Arc<CredentialIssuer>,
}

impl std::fmt::Debug for TicketIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketIssuer")
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

impl TicketIssuer {
    pub fn new(
        ledger: Arc<dyn TicketLedger>,
        verifier: Arc<dyn ProofVerifier>,
        credentials: Arc<CredentialIssuer>,
    ) -> Self {
        Self {
            ledger,
            verifier,
            credentials,
        }
    }

    pub fn ledger(&self) -> Arc<dyn TicketLedger> {
        self.ledger.clone()
    }

    pub async fn issue(
        &self,
        submission: &TicketSubmission,
        return_url: &str,
    ) -> Result<IssuanceOutcome> {
        let payload = submission
            .proof
            .as_ref()
            .ok_or_else(|| IssuanceError::InvalidInput("No proof provided".to_string()))?;
        payload
            .validate()
            .map_err(|e| IssuanceError::InvalidInput(e.to_string()))?;

        let ticket_id = TicketId::derive(&payload.public_output, submission.is_inviting())
            .map_err(|e| IssuanceError::InvalidInput(e.to_string()))?;

        let exists = self.ledger.exists(&ticket_id).await.inspect_err(|e| {
            tracing::error!(%ticket_id, error = %e, "ticket lookup failed");
        })?;
        if exists {
            tracing::info!(%ticket_id, "ticket already issued");
            return Ok(IssuanceOutcome::AlreadyIssued { ticket_id });
        }

        let is_valid = self
            .verifier
            .verify(&payload.proof, &payload.public_output)
            .await
            .inspect_err(|e| {
                tracing::error!(%ticket_id, error = %e, "proof verification failed to run");
            })?;
        if !is_valid {
            tracing::warn!(%ticket_id, "proof failed verification");
            return Err(IssuanceError::InvalidProof(ticket_id));
        }
        tracing::info!(%ticket_id, inviting = submission.is_inviting(), "proof verified");

        let envelope = self
            .credentials
            .build_envelope(&submission.name, &submission.email, ticket_id);
        // signing happens before the insert so a signing failure leaves no row behind
        let claim_url = self
            .credentials
            .build_claim_url(&envelope, return_url)
            .inspect_err(|e| {
                tracing::error!(%ticket_id, error = %e, "failed to sign ticket");
            })?;

        match self
            .ledger
            .insert(&ticket_id, &submission.name, &submission.email)
            .await
        {
            Ok(()) => {}
            Err(LedgerError::DuplicateTicket(_)) => {
                tracing::info!(%ticket_id, "lost issuance race, ticket already issued");
                return Ok(IssuanceOutcome::AlreadyIssued { ticket_id });
            }
            Err(e) => {
                tracing::error!(%ticket_id, error = %e, "failed to record ticket");
                return Err(e.into());
            }
        }

        tracing::info!(%ticket_id, "ticket issued");
        Ok(IssuanceOutcome::Issued {
            ticket_id,
            claim_url,
        })
    }
}
