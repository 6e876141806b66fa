use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::TicketId;

/// Ticket fields signed into an `eddsa-ticket-pcd` credential.
///
/// Field names follow the wallet's ticket schema, so the struct serializes in camelCase.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketData {
    pub attendee_name: String,
    pub attendee_email: String,
    pub event_name: String,
    pub ticket_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checker_email: Option<String>,
    pub ticket_id: TicketId,
    pub event_id: String,
    pub product_id: String,
    pub timestamp_consumed: i64,
    pub timestamp_signed: i64,
    pub attendee_semaphore_id: String,
    pub is_consumed: bool,
    pub is_revoked: bool,
    pub ticket_category: u8,
}

/// Event-wide ticket values that do not depend on the attendee.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TicketTemplate {
    pub event_name: String,
    pub ticket_name: String,
    pub attendee_semaphore_id: String,
    pub ticket_category: u8,
}

impl Default for TicketTemplate {
    fn default() -> Self {
        Self {
            event_name: "Devcoff".to_string(),
            ticket_name: "gathering".to_string(),
            attendee_semaphore_id: "12345".to_string(),
            ticket_category: 1,
        }
    }
}

impl TicketTemplate {
    /// Build a fresh, unconsumed and unrevoked ticket signed now.
    pub fn build_envelope(
        &self,
        name: &str,
        email: &str,
        ticket_id: TicketId,
        event_id: &str,
        product_id: &str,
    ) -> TicketData {
        self.build_envelope_at(name, email, ticket_id, event_id, product_id, Utc::now())
    }

    pub fn build_envelope_at(
        &self,
        name: &str,
        email: &str,
        ticket_id: TicketId,
        event_id: &str,
        product_id: &str,
        signed_at: DateTime<Utc>,
    ) -> TicketData {
        TicketData {
            attendee_name: name.to_string(),
            attendee_email: email.to_string(),
            event_name: self.event_name.clone(),
            ticket_name: self.ticket_name.clone(),
            checker_email: None,
            ticket_id,
            event_id: event_id.to_string(),
            product_id: product_id.to_string(),
            timestamp_consumed: 0,
            timestamp_signed: signed_at.timestamp_millis(),
            attendee_semaphore_id: self.attendee_semaphore_id.clone(),
            is_consumed: false,
            is_revoked: false,
            ticket_category: self.ticket_category,
        }
    }
}
