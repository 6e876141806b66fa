//! Groth16 proof verification for ticket issuance.
//!
//! [`ProofVerifier`] is the seam the issuance pipeline depends on.
//! [`SnarkjsVerifier`] runs `snarkjs groth16 verify` against a fixed
//! verification key, with the proof and public output passed as temporary files.

pub mod error;
pub mod snarkjs;

use async_trait::async_trait;
use serde_json::Value;

pub use error::{Result, VerifierError};
pub use snarkjs::{SnarkjsConfig, SnarkjsVerifier};

#[async_trait]
pub trait ProofVerifier: Send + Sync {
    /// `Ok(false)` for a proof that does not verify, `Err` only when verification could not run.
    async fn verify(&self, proof: &Value, public_output: &Value) -> Result<bool>;
}
