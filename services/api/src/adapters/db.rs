//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `SessionStore` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use portfolio_copilot_core::domain::Session;
use portfolio_copilot_core::ports::{PortError, PortResult, SessionStore};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};

/// Every session row lives under this partition key.
pub const SESSION_PARTITION: &str = "session";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `SessionStore` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct SessionRecord {
    data: Json<Session>,
}
impl SessionRecord {
    fn to_domain(self) -> Session {
        self.data.0
    }
}

fn db_error(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// `SessionStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl SessionStore for DbAdapter {
    async fn get(&self, user_id: &str) -> PortResult<Option<Session>> {
        let record = sqlx::query_as::<_, SessionRecord>(
            "SELECT data FROM sessions WHERE partition = $1 AND row_key = $2",
        )
        .bind(SESSION_PARTITION)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(record.map(SessionRecord::to_domain))
    }

    async fn put(&self, user_id: &str, session: &Session) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO sessions (partition, row_key, data, updated_at) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (partition, row_key) DO UPDATE SET data = EXCLUDED.data, updated_at = EXCLUDED.updated_at",
        )
        .bind(SESSION_PARTITION)
        .bind(user_id)
        .bind(Json(session))
        .bind(session.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn delete(&self, user_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM sessions WHERE partition = $1 AND row_key = $2")
            .bind(SESSION_PARTITION)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }
}
