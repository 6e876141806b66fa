use color_eyre::{eyre::Context, Result};
use devcoff_primitives::env::Environment;
use devcoff_server::{
    config::{Config, IssuerSettings},
    credential::CredentialIssuer,
    issuance::TicketIssuer,
    ledger::{PgTicketLedger, PostgresSettings, TicketLedger},
    router,
    state::AppState,
};
use devcoff_verifier::SnarkjsVerifier;
use dotenv::dotenv;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Devcoff ticket server
/// Handles:
/// - verification of Devcon rejection proofs and issuance of signed Zupass tickets
/// - status queries for issued tickets
#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenv().ok();

    // Load configuration json
    let config = Config::from_file("config.json").context("Failed to load config")?;

    // setup tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_max_level(config.log_level()?)
        .init();

    let environment = Environment::from_env_var();
    info!("Starting in {} mode", environment.as_str());
    let settings =
        IssuerSettings::from_env(environment).context("Invalid issuer configuration")?;

    tracing::info!("Setting up database");
    let ledger = PgTicketLedger::connect(&PostgresSettings::from_env())
        .await
        .context("Failed to connect to postgres")?;
    ledger
        .ensure_schema()
        .await
        .context("Failed to create tickets table")?;

    tracing::info!("Setting up verifier");
    let verifier_config = config.verifier_config();
    if !verifier_config.verification_key.exists() {
        tracing::warn!(
            "Verification key {} not found, every proof will be rejected",
            verifier_config.verification_key.display()
        );
    }
    let verifier = SnarkjsVerifier::new(verifier_config);

    tracing::info!("Setting up credential issuer");
    let credentials = CredentialIssuer::new(
        settings.signing_key,
        config.wallet_url()?,
        config.ticket.clone(),
        config.credential_title.clone(),
        settings.event_id,
        settings.product_id,
    );
    info!(signer = ?credentials.verifying_key(), "Ticket signer ready");

    let issuer = TicketIssuer::new(Arc::new(ledger), Arc::new(verifier), Arc::new(credentials));
    let app_state = AppState::new(issuer, config.public_origin.clone(), settings.tg_link);
    let app = router(app_state);

    tracing::info!("Starting server");
    let server_url = format!("0.0.0.0:{}", config.server_port);
    let listener = TcpListener::bind(server_url).await.context(format!(
        "Failed to bind server to port {}",
        config.server_port
    ))?;

    info!("Server running on port {}", config.server_port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    wait_for_signal(tokio::signal::ctrl_c()).await
}

/// Resolves once `signal` fires. If the listener cannot be installed, never resolves.
async fn wait_for_signal(signal: impl std::future::Future<Output = std::io::Result<()>>) {
    if let Err(e) = signal.await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal, shutting down...");
}
