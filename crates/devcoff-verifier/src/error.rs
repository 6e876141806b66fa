use thiserror::Error;

/// Infrastructure failures while verifying. A proof that simply does not verify is not an error.
#[derive(Debug, Error)]
pub enum VerifierError {
    #[error("Scratch artifact error: {0}")]
    ScratchError(String),
    #[error("Failed to serialize verifier input: {0}")]
    SerializationError(String),
    #[error("Failed to run verifier: {0}")]
    ExecutionFailed(String),
    #[error("Verification timed out after {0:?}")]
    Timeout(std::time::Duration),
}

pub type Result<T> = core::result::Result<T, VerifierError>;
