use std::sync::Arc;

use crate::issuance::TicketIssuer;
use crate::ledger::TicketLedger;

/// Shared handler state, cloned per request.
#[derive(Clone, Debug)]
pub struct AppState {
    issuer: TicketIssuer,
    public_origin: String,
    tg_link: Option<String>,
}

impl AppState {
    pub fn new(issuer: TicketIssuer, public_origin: String, tg_link: Option<String>) -> Self {
        Self {
            issuer,
            public_origin,
            tg_link,
        }
    }

    pub fn issuer(&self) -> &TicketIssuer {
        &self.issuer
    }

    pub fn ledger(&self) -> Arc<dyn TicketLedger> {
        self.issuer.ledger()
    }

    pub fn public_origin(&self) -> &str {
        &self.public_origin
    }

    pub fn tg_link(&self) -> Option<&str> {
        self.tg_link.as_deref()
    }
}
