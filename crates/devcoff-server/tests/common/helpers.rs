use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use devcoff_primitives::TicketTemplate;
use devcoff_server::{
    credential::CredentialIssuer, issuance::TicketIssuer, ledger::MemoryTicketLedger, router,
    state::AppState,
};
use devcoff_verifier::{ProofVerifier, VerifierError};
use ed25519_dalek::SigningKey;
use serde_json::Value;
use tokio::sync::Barrier;
use tower::util::ServiceExt;
use url::Url;

pub const MAX_BODY_SIZE: usize = 1024 * 1024; // 1 MB limit
pub const WALLET_URL: &str = "https://staging.zupass.org";
pub const PUBLIC_ORIGIN: &str = "http://localhost:3000";
pub const TG_LINK: &str = "https://t.me/+devcoff";

/// Returns a fixed verdict and counts calls.
#[derive(Debug, Default)]
pub struct FixedVerifier {
    verdict: bool,
    calls: AtomicUsize,
}

impl FixedVerifier {
    pub fn accepting() -> Arc<Self> {
        Arc::new(Self {
            verdict: true,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn rejecting() -> Arc<Self> {
        Arc::new(Self {
            verdict: false,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProofVerifier for FixedVerifier {
    async fn verify(&self, _proof: &Value, _public_output: &Value) -> Result<bool, VerifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.verdict)
    }
}

/// Always times out, standing in for a hung verifier process.
#[derive(Debug, Default)]
pub struct TimedOutVerifier;

#[async_trait]
impl ProofVerifier for TimedOutVerifier {
    async fn verify(&self, _proof: &Value, _public_output: &Value) -> Result<bool, VerifierError> {
        Err(VerifierError::Timeout(std::time::Duration::from_secs(30)))
    }
}

/// Accepts once `n` callers are inside `verify`, so they all pass the existence check together.
#[derive(Debug)]
pub struct BarrierVerifier {
    barrier: Barrier,
}

impl BarrierVerifier {
    pub fn new(n: usize) -> Arc<Self> {
        Arc::new(Self {
            barrier: Barrier::new(n),
        })
    }
}

#[async_trait]
impl ProofVerifier for BarrierVerifier {
    async fn verify(&self, _proof: &Value, _public_output: &Value) -> Result<bool, VerifierError> {
        self.barrier.wait().await;
        Ok(true)
    }
}

pub fn signing_key() -> SigningKey {
    SigningKey::from_bytes(&[42u8; 32])
}

pub fn credential_issuer() -> Arc<CredentialIssuer> {
    Arc::new(CredentialIssuer::new(
        signing_key(),
        Url::parse(WALLET_URL).unwrap(),
        TicketTemplate::default(),
        "Devcoff".to_string(),
        "event-id".to_string(),
        "product-id".to_string(),
    ))
}

pub fn ticket_issuer(
    ledger: Arc<MemoryTicketLedger>,
    verifier: Arc<dyn ProofVerifier>,
) -> TicketIssuer {
    TicketIssuer::new(ledger, verifier, credential_issuer())
}

pub fn setup_app(verifier: Arc<dyn ProofVerifier>) -> (Router, Arc<MemoryTicketLedger>) {
    let ledger = Arc::new(MemoryTicketLedger::new());
    let issuer = ticket_issuer(ledger.clone(), verifier);
    let state = AppState::new(
        issuer,
        PUBLIC_ORIGIN.to_string(),
        Some(TG_LINK.to_string()),
    );
    (router(state), ledger)
}

pub fn issue_request(body: &Value, origin: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/ticket")
        .header("Content-Type", "application/json");
    if let Some(origin) = origin {
        builder = builder.header("Origin", origin);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response: Response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), MAX_BODY_SIZE).await.unwrap();
    let body = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, body)
}

/// Collects formatted log output for the current thread while the guard is alive.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn install() -> (Self, tracing::subscriber::DefaultGuard) {
        let logs = Self::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || writer.clone())
            .finish();
        (logs, tracing::subscriber::set_default(subscriber))
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
