//! Signed ticket credentials and the wallet claim URL that carries them.
//!
//! The ticket envelope is signed here, on the server, with the issuer's Ed25519
//! key. The wallet only ever receives the serialized PCD (ticket, signer public
//! key and signature) inside a Zupass `Add` request. The private key never
//! leaves the process.

use devcoff_primitives::{TicketData, TicketId, TicketTemplate};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::{form_urlencoded, Url};
use uuid::Uuid;

/// Type id of the Ed25519 ticket credential. It is not the wallet's Baby Jubjub `eddsa-ticket-pcd`.
pub const TICKET_PCD_TYPE: &str = "devcoff-ed25519-ticket-pcd";

/// Appended to the caller's origin to form the wallet's return URL.
pub const POPUP_PATH: &str = "/popup";

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Failed to serialize credential: {0}")]
    SerializationError(String),
    #[error("Invalid signer key: {0}")]
    KeyError(String),
    #[error("Invalid signature: {0}")]
    SignatureError(String),
}

pub type Result<T> = core::result::Result<T, CredentialError>;

/// Wire form of any PCD: its type and the JSON-encoded body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedPcd {
    #[serde(rename = "type")]
    pub pcd_type: String,
    pub pcd: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketClaim {
    pub ticket: TicketData,
    /// Hex encoded Ed25519 public key of the issuer.
    pub signer: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketProof {
    /// Hex encoded Ed25519 signature over the JSON encoding of the ticket.
    pub signature: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ed25519TicketPcd {
    pub id: String,
    pub claim: TicketClaim,
    pub proof: TicketProof,
}

impl Ed25519TicketPcd {
    /// Check the signature against the embedded signer key.
    pub fn verify(&self) -> Result<bool> {
        let signer = decode_fixed::<32>(&self.claim.signer)
            .and_then(|bytes| {
                VerifyingKey::from_bytes(&bytes).map_err(|e| CredentialError::KeyError(e.to_string()))
            })?;
        let signature = Signature::from_bytes(&decode_fixed::<64>(&self.proof.signature)?);
        let message = ticket_message(&self.claim.ticket)?;
        Ok(signer.verify(&message, &signature).is_ok())
    }

    pub fn serialize(&self) -> Result<SerializedPcd> {
        Ok(SerializedPcd {
            pcd_type: TICKET_PCD_TYPE.to_string(),
            pcd: serde_json::to_string(self)
                .map_err(|e| CredentialError::SerializationError(e.to_string()))?,
        })
    }

    pub fn deserialize(serialized: &SerializedPcd) -> Result<Self> {
        serde_json::from_str(&serialized.pcd)
            .map_err(|e| CredentialError::SerializationError(e.to_string()))
    }
}

/// Zupass `Add` request, carried URL encoded in the claim URL fragment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddRequest {
    #[serde(rename = "type")]
    pub request_type: String,
    pub return_url: String,
    pub pcd: SerializedPcd,
    pub folder: String,
    pub post_message: bool,
}

impl AddRequest {
    /// Recover the request from a claim URL built by [`CredentialIssuer::build_claim_url`].
    pub fn from_claim_url(url: &Url) -> Option<Self> {
        let query = url.fragment()?.strip_prefix("/add?")?;
        let (_, request) = form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == "request")?;
        serde_json::from_str(&request).ok()
    }
}

fn ticket_message(ticket: &TicketData) -> Result<Vec<u8>> {
    serde_json::to_vec(ticket).map_err(|e| CredentialError::SerializationError(e.to_string()))
}

fn decode_fixed<const N: usize>(value: &str) -> Result<[u8; N]> {
    let bytes = hex::decode(value).map_err(|e| CredentialError::SignatureError(e.to_string()))?;
    bytes.as_slice().try_into().map_err(|_| {
        CredentialError::SignatureError(format!("expected {N} bytes, got {}", bytes.len()))
    })
}

/// The wallet returns to `<origin>/popup` once the credential is imported.
pub fn return_url(origin: &str) -> String {
    format!("{}{POPUP_PATH}", origin.trim_end_matches('/'))
}

pub struct CredentialIssuer {
    signing_key: SigningKey,
    wallet_url: Url,
    template: TicketTemplate,
    title: String,
    event_id: String,
    product_id: String,
}

impl std::fmt::Debug for CredentialIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialIssuer")
            .field("signer", &hex::encode(self.verifying_key().as_bytes()))
            .field("wallet_url", &self.wallet_url.as_str())
            .field("title", &self.title)
            .field("event_id", &self.event_id)
            .field("product_id", &self.product_id)
            .finish()
    }
}

impl CredentialIssuer {
    pub fn new(
        signing_key: SigningKey,
        wallet_url: Url,
        template: TicketTemplate,
        title: String,
        event_id: String,
        product_id: String,
    ) -> Self {
        Self {
            signing_key,
            wallet_url,
            template,
            title,
            event_id,
            product_id,
        }
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Ticket envelope for this issuer's event and product.
    pub fn build_envelope(&self, name: &str, email: &str, ticket_id: TicketId) -> TicketData {
        self.template
            .build_envelope(name, email, ticket_id, &self.event_id, &self.product_id)
    }

    pub fn sign(&self, ticket: &TicketData) -> Result<Ed25519TicketPcd> {
        let signature = self.signing_key.sign(&ticket_message(ticket)?);
        Ok(Ed25519TicketPcd {
            id: Uuid::new_v4().to_string(),
            claim: TicketClaim {
                ticket: ticket.clone(),
                signer: hex::encode(self.verifying_key().as_bytes()),
            },
            proof: TicketProof {
                signature: hex::encode(signature.to_bytes()),
            },
        })
    }

    /// Sign `ticket` and wrap it in a wallet `Add` request URL.
    pub fn build_claim_url(&self, ticket: &TicketData, return_url: &str) -> Result<Url> {
        let request = AddRequest {
            request_type: "Add".to_string(),
            return_url: return_url.to_string(),
            pcd: self.sign(ticket)?.serialize()?,
            folder: self.title.clone(),
            post_message: false,
        };
        let request = serde_json::to_string(&request)
            .map_err(|e| CredentialError::SerializationError(e.to_string()))?;
        let encoded: String = form_urlencoded::byte_serialize(request.as_bytes()).collect();

        let mut url = self.wallet_url.clone();
        url.set_fragment(Some(&format!("/add?request={encoded}")));
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn issuer() -> CredentialIssuer {
        CredentialIssuer::new(
            SigningKey::from_bytes(&[7u8; 32]),
            Url::parse("https://staging.zupass.org").unwrap(),
            TicketTemplate::default(),
            "Devcoff".to_string(),
            "event-1".to_string(),
            "product-1".to_string(),
        )
    }

    fn ticket(issuer: &CredentialIssuer) -> TicketData {
        let id = TicketId::derive(&json!({"foo": 1}), false).unwrap();
        issuer.build_envelope("Ada Lovelace", "ada@example.com", id)
    }

    #[test]
    fn envelope_uses_configured_ids() {
        let issuer = issuer();
        let ticket = ticket(&issuer);
        assert_eq!(ticket.event_id, "event-1");
        assert_eq!(ticket.product_id, "product-1");
        assert_eq!(ticket.attendee_name, "Ada Lovelace");
    }

    #[test]
    fn claim_url_round_trips_a_verifiable_pcd() {
        let issuer = issuer();
        let ticket = ticket(&issuer);
        let url = issuer
            .build_claim_url(&ticket, &return_url("https://devcoff.xyz"))
            .unwrap();

        assert_eq!(url.host_str(), Some("staging.zupass.org"));
        assert!(url.fragment().unwrap().starts_with("/add?request="));

        let request = AddRequest::from_claim_url(&url).unwrap();
        assert_eq!(request.request_type, "Add");
        assert_eq!(request.return_url, "https://devcoff.xyz/popup");
        assert_eq!(request.folder, "Devcoff");
        assert_eq!(request.pcd.pcd_type, "devcoff-ed25519-ticket-pcd");

        let pcd = Ed25519TicketPcd::deserialize(&request.pcd).unwrap();
        assert_eq!(pcd.claim.ticket, ticket);
        assert!(pcd.verify().unwrap());
    }

    #[test]
    fn claim_url_never_contains_the_private_key() {
        let issuer = issuer();
        let url = issuer
            .build_claim_url(&ticket(&issuer), "https://devcoff.xyz/popup")
            .unwrap();
        let secret = hex::encode([7u8; 32]);
        assert!(!url.as_str().contains(&secret));
        assert!(!url.as_str().contains("privateKey"));
    }

    #[test]
    fn tampered_ticket_fails_verification() {
        let issuer = issuer();
        let mut pcd = issuer.sign(&ticket(&issuer)).unwrap();
        pcd.claim.ticket.is_revoked = true;
        assert!(!pcd.verify().unwrap());
    }

    #[test]
    fn return_url_appends_popup_once() {
        assert_eq!(return_url("https://devcoff.xyz/"), "https://devcoff.xyz/popup");
        assert_eq!(return_url("http://localhost:3000"), "http://localhost:3000/popup");
    }
}
