//! Shared application state for the HTTP layer and the binaries.
//!
//! `CoreState` owns the resolved configuration and hands out fresh
//! SQLite connections and LLM clients. It is wrapped in `Arc` at startup.

use std::path::Path;
use std::sync::{Arc, RwLock};

use rusqlite::Connection;

use crate::config::WorkbenchConfig;
use crate::db;
use crate::llm::{LlmClient, OpenAiClient};

pub struct CoreState {
    pub config: WorkbenchConfig,
    /// Replaces the configured OpenAI client when set (tests, local stubs).
    llm_override: RwLock<Option<Arc<dyn LlmClient>>>,
}

impl CoreState {
    pub fn new(config: WorkbenchConfig) -> Self {
        Self {
            config,
            llm_override: RwLock::new(None),
        }
    }

    /// Create the database file if needed and bring the schema up to date.
    pub fn initialize_database(&self) -> Result<(), CoreError> {
        let conn = db::open_database(self.db_path())?;
        let tables = db::count_tables(&conn)?;
        tracing::info!(path = %self.db_path().display(), tables, "Database ready");
        Ok(())
    }

    pub fn db_path(&self) -> &Path {
        &self.config.database_path
    }

    /// Open a connection for one unit of work.
    pub fn open_db(&self) -> Result<Connection, CoreError> {
        Ok(db::connect(self.db_path())?)
    }

    pub fn admin_password(&self) -> &str {
        &self.config.admin_password
    }

    // ── LLM access ──────────────────────────────────────────

    pub fn set_llm_client(&self, client: Arc<dyn LlmClient>) -> Result<(), CoreError> {
        let mut guard = self.llm_override.write().map_err(|_| CoreError::LockPoisoned)?;
        *guard = Some(client);
        Ok(())
    }

    fn override_client(&self) -> Option<Arc<dyn LlmClient>> {
        self.llm_override.read().ok().and_then(|guard| guard.clone())
    }

    fn openai_client(&self, api_key: &str) -> Arc<dyn LlmClient> {
        Arc::new(OpenAiClient::new(
            api_key,
            &self.config.ai.base_url,
            self.config.ai.timeout_secs,
        ))
    }

    /// Client for the chat assistant; `None` when no key is configured.
    pub fn chat_client(&self) -> Option<Arc<dyn LlmClient>> {
        if let Some(client) = self.override_client() {
            return Some(client);
        }
        let key = self.config.ai.api_key.as_deref()?;
        Some(self.openai_client(key))
    }

    /// Client for document extraction. A per-request key wins over the
    /// configured one.
    pub fn extraction_client(&self, key_override: Option<&str>) -> Option<Arc<dyn LlmClient>> {
        if let Some(client) = self.override_client() {
            return Some(client);
        }
        let key = key_override
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .or(self.config.ai.api_key.as_deref())?;
        Some(self.openai_client(key))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Internal lock error")]
    LockPoisoned,
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;

    fn state_in(dir: &tempfile::TempDir) -> CoreState {
        CoreState::new(WorkbenchConfig::with_database(dir.path().join("workbench.db")))
    }

    #[test]
    fn initialize_then_open() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(&dir);
        state.initialize_database().unwrap();

        let conn = state.open_db().unwrap();
        assert!(db::ping(&conn).is_ok());
        assert_eq!(db::count_tables(&conn).unwrap(), 9);
    }

    #[test]
    fn no_key_means_no_client() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(&dir);
        assert!(state.chat_client().is_none());
        assert!(state.extraction_client(None).is_none());
        assert!(state.extraction_client(Some("   ")).is_none());
    }

    #[test]
    fn request_key_enables_extraction_only() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(&dir);
        assert!(state.extraction_client(Some("sk-upload")).is_some());
        assert!(state.chat_client().is_none());
    }

    #[test]
    fn configured_key_enables_both() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = WorkbenchConfig::with_database(dir.path().join("workbench.db"));
        config.ai.api_key = Some("sk-config".into());
        let state = CoreState::new(config);
        assert!(state.chat_client().is_some());
        assert!(state.extraction_client(None).is_some());
    }

    #[test]
    fn override_client_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(&dir);
        let mock = Arc::new(MockLlmClient::new("hello"));
        state.set_llm_client(mock.clone()).unwrap();

        let client = state.chat_client().unwrap();
        let request = crate::llm::ChatRequest {
            model: "m".into(),
            temperature: 0.0,
            messages: vec![crate::llm::ChatMessage::user("hi")],
        };
        assert_eq!(client.complete(&request).unwrap(), "hello");
        assert_eq!(mock.requests().len(), 1);
    }
}
