use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrimitivesError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Invalid ticket id: {0}")]
    InvalidTicketId(String),
}

pub type Result<T> = core::result::Result<T, PrimitivesError>;
