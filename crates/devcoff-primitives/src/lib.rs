//! Core types for Devcoff ticket issuance
//!
//! Ticket identities, the ticket envelope that gets signed into a credential,
//! and the submission shape accepted from the proving pipeline.

pub mod env;
pub mod error;
pub mod identity;
pub mod submission;
pub mod ticket;

pub use error::{PrimitivesError, Result};
pub use identity::TicketId;
pub use submission::{ProofPayload, TicketSubmission};
pub use ticket::{TicketData, TicketTemplate};
