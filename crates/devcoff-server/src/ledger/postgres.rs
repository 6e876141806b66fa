use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::{Manager, Pool};
use devcoff_primitives::TicketId;
use tokio_postgres::{error::SqlState, Config, NoTls, Row};

use super::{LedgerError, Result, TicketLedger, TicketRecord};

pub const CREATE_TICKETS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS tickets (
        id SERIAL PRIMARY KEY,
        ticket_id TEXT UNIQUE NOT NULL,
        name TEXT,
        email TEXT,
        created_at TIMESTAMP WITH TIME ZONE DEFAULT CURRENT_TIMESTAMP
    );
";

pub const TICKET_EXISTS: &str = "
    SELECT EXISTS(SELECT 1 FROM tickets WHERE ticket_id = $1);
";

pub const INSERT_TICKET: &str = "
    INSERT INTO tickets (ticket_id, name, email)
    VALUES ($1, $2, $3);
";

pub const GET_TICKET: &str = "
    SELECT ticket_id, name, email, created_at FROM tickets
    WHERE ticket_id = $1;
";

/// Connection settings, read from `POSTGRES_*` environment variables.
#[derive(Clone, Debug)]
pub struct PostgresSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub dbname: String,
    pub pool_size: usize,
}

impl PostgresSettings {
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("POSTGRES_URL").unwrap_or("localhost".to_string()),
            port: std::env::var("POSTGRES_PORT")
                .ok()
                .and_then(|port| port.parse::<u16>().ok())
                .unwrap_or(5432),
            user: std::env::var("POSTGRES_USER").unwrap_or("devcoff".to_string()),
            password: std::env::var("POSTGRES_PASSWORD").ok(),
            dbname: std::env::var("POSTGRES_DB").unwrap_or("devcoff-db".to_string()),
            pool_size: 5,
        }
    }

    fn pg_config(&self) -> Config {
        let mut config = Config::new();
        config.host(&self.host);
        config.port(self.port);
        config.user(&self.user);
        if let Some(password) = &self.password {
            config.password(password);
        }
        config.dbname(&self.dbname);
        config
    }
}

#[derive(Clone)]
pub struct PgTicketLedger {
    pool: Pool,
}

impl std::fmt::Debug for PgTicketLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgTicketLedger")
            .field("pool", &self.pool.status())
            .finish()
    }
}

impl PgTicketLedger {
    /// Build the pool and check that the database answers.
    pub async fn connect(settings: &PostgresSettings) -> Result<Self> {
        let manager = Manager::new(settings.pg_config(), NoTls);
        let pool = Pool::builder(manager)
            .max_size(settings.pool_size)
            .build()
            .map_err(|e| LedgerError::DatabaseError(e.to_string()))?;
        {
            let client = pool.get().await.map_err(database_error)?;
            client
                .simple_query("SELECT 1")
                .await
                .map_err(database_error)?;
        }
        Ok(Self { pool })
    }

    async fn client(&self) -> Result<deadpool_postgres::Object> {
        self.pool.get().await.map_err(database_error)
    }
}

fn database_error(e: impl std::fmt::Display) -> LedgerError {
    LedgerError::DatabaseError(e.to_string())
}

impl TryFrom<Row> for TicketRecord {
    type Error = LedgerError;
    fn try_from(row: Row) -> Result<Self> {
        let ticket_id: String = row
            .try_get("ticket_id")
            .map_err(|e| LedgerError::RowError(e.to_string()))?;
        let name: Option<String> = row
            .try_get("name")
            .map_err(|e| LedgerError::RowError(e.to_string()))?;
        let email: Option<String> = row
            .try_get("email")
            .map_err(|e| LedgerError::RowError(e.to_string()))?;
        let created_at: DateTime<Utc> = row
            .try_get("created_at")
            .map_err(|e| LedgerError::RowError(e.to_string()))?;
        Ok(TicketRecord {
            ticket_id: ticket_id
                .parse()
                .map_err(|e: devcoff_primitives::PrimitivesError| {
                    LedgerError::RowError(e.to_string())
                })?,
            name: name.unwrap_or_default(),
            email: email.unwrap_or_default(),
            created_at,
        })
    }
}

#[async_trait]
impl TicketLedger for PgTicketLedger {
    async fn ensure_schema(&self) -> Result<()> {
        let conn = self.client().await?;
        conn.batch_execute(CREATE_TICKETS_TABLE)
            .await
            .map_err(database_error)?;
        Ok(())
    }

    async fn exists(&self, ticket_id: &TicketId) -> Result<bool> {
        let conn = self.client().await?;
        let prepared_stmt = conn.prepare(TICKET_EXISTS).await.map_err(database_error)?;
        let row = conn
            .query_one(&prepared_stmt, &[&ticket_id.to_string()])
            .await
            .map_err(database_error)?;
        row.try_get(0)
            .map_err(|e| LedgerError::RowError(e.to_string()))
    }

    async fn insert(&self, ticket_id: &TicketId, name: &str, email: &str) -> Result<()> {
        let conn = self.client().await?;
        let prepared_stmt = conn.prepare(INSERT_TICKET).await.map_err(database_error)?;
        conn.execute(&prepared_stmt, &[&ticket_id.to_string(), &name, &email])
            .await
            .map_err(|e| {
                if e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
                    LedgerError::DuplicateTicket(*ticket_id)
                } else {
                    database_error(e)
                }
            })?;
        Ok(())
    }

    async fn get(&self, ticket_id: &TicketId) -> Result<Option<TicketRecord>> {
        let conn = self.client().await?;
        let prepared_stmt = conn.prepare(GET_TICKET).await.map_err(database_error)?;
        conn.query_opt(&prepared_stmt, &[&ticket_id.to_string()])
            .await
            .map_err(database_error)?
            .map(TicketRecord::try_from)
            .transpose()
    }
}
