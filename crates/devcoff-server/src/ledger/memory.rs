use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use devcoff_primitives::TicketId;

use super::{LedgerError, Result, TicketLedger, TicketRecord};

/// Process-local ledger with the same uniqueness contract as the Postgres one.
#[derive(Debug, Default)]
pub struct MemoryTicketLedger {
    records: Mutex<HashMap<TicketId, TicketRecord>>,
}

impl MemoryTicketLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().map(|records| records.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<TicketId, TicketRecord>>> {
        self.records
            .lock()
            .map_err(|e| LedgerError::DatabaseError(e.to_string()))
    }
}

#[async_trait]
impl TicketLedger for MemoryTicketLedger {
    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn exists(&self, ticket_id: &TicketId) -> Result<bool> {
        Ok(self.lock()?.contains_key(ticket_id))
    }

    async fn insert(&self, ticket_id: &TicketId, name: &str, email: &str) -> Result<()> {
        let mut records = self.lock()?;
        if records.contains_key(ticket_id) {
            return Err(LedgerError::DuplicateTicket(*ticket_id));
        }
        records.insert(
            *ticket_id,
            TicketRecord {
                ticket_id: *ticket_id,
                name: name.to_string(),
                email: email.to_string(),
                created_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn get(&self, ticket_id: &TicketId) -> Result<Option<TicketRecord>> {
        Ok(self.lock()?.get(ticket_id).cloned())
    }
}
