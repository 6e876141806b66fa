//! Durable record of issued tickets.
//!
//! The uniqueness of `ticket_id` is enforced by the store itself. Callers may
//! check [`TicketLedger::exists`] first, but only [`TicketLedger::insert`]
//! decides who wins a race.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use devcoff_primitives::TicketId;
use serde::Serialize;
use thiserror::Error;

pub use memory::MemoryTicketLedger;
pub use postgres::{PgTicketLedger, PostgresSettings};

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Ticket {0} has already been issued")]
    DuplicateTicket(TicketId),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Malformed ticket row: {0}")]
    RowError(String),
}

pub type Result<T> = core::result::Result<T, LedgerError>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketRecord {
    pub ticket_id: TicketId,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait TicketLedger: Send + Sync {
    /// Create the backing table if it does not exist. Safe to call on every start.
    async fn ensure_schema(&self) -> Result<()>;

    async fn exists(&self, ticket_id: &TicketId) -> Result<bool>;

    /// Fails with [`LedgerError::DuplicateTicket`] when the id is already recorded.
    async fn insert(&self, ticket_id: &TicketId, name: &str, email: &str) -> Result<()>;

    async fn get(&self, ticket_id: &TicketId) -> Result<Option<TicketRecord>>;
}
