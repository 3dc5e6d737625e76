//! services/api/src/adapters/memory.rs
//!
//! An in-process `SessionStore` for local development and tests. Sessions are
//! kept as serialized JSON so reads behave like the database adapter's.

use async_trait::async_trait;
use portfolio_copilot_core::domain::Session;
use portfolio_copilot_core::ports::{PortError, PortResult, SessionStore};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemorySessionStore {
    rows: RwLock<HashMap<String, String>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, user_id: &str) -> PortResult<Option<Session>> {
        let rows = self.rows.read().await;
        rows.get(user_id)
            .map(|data| serde_json::from_str(data))
            .transpose()
            .map_err(|e| PortError::Unexpected(format!("Stored session is not valid JSON: {}", e)))
    }

    async fn put(&self, user_id: &str, session: &Session) -> PortResult<()> {
        let data =
            serde_json::to_string(session).map_err(|e| PortError::Unexpected(e.to_string()))?;
        self.rows.write().await.insert(user_id.to_string(), data);
        Ok(())
    }

    async fn delete(&self, user_id: &str) -> PortResult<()> {
        self.rows.write().await.remove(user_id);
        Ok(())
    }
}
