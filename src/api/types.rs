//! Shared types for the HTTP layer.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::core_state::CoreState;

/// Shared context for all routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self { core }
    }

    /// Fresh connection for one request.
    pub fn db(&self) -> Result<rusqlite::Connection, ApiError> {
        Ok(self.core.open_db()?)
    }
}

/// Request id assigned by the request-log middleware.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// `?agency_id=` filter shared by contacts, logs and tasks.
#[derive(Debug, Default, Deserialize)]
pub struct AgencyFilter {
    pub agency_id: Option<i64>,
}

/// `?office=` filter shared by employees and agencies.
#[derive(Debug, Default, Deserialize)]
pub struct OfficeFilter {
    pub office: Option<String>,
}

impl OfficeFilter {
    pub fn code(&self) -> Option<&str> {
        self.office.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }
}

/// `{detail}` acknowledgement body.
#[derive(Debug, Serialize)]
pub struct Detail {
    pub detail: &'static str,
}

/// `{message}` acknowledgement body.
#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}
