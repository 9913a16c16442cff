use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "Underwriting Workbench";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_DATABASE_URL: &str = "sqlite:///./private/databases/workbench.db";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";
pub const DEFAULT_CORS_ORIGINS: &[&str] = &["http://localhost:5173", "http://127.0.0.1:5173"];
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
pub const DEFAULT_AI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-5.1";
pub const DEFAULT_EXTRACTION_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_AI_TIMEOUT_SECS: u64 = 120;

/// Filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "workbench=info,workbench_lib=info,tower_http=info"
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unsupported DATABASE_URL '{0}': only sqlite URLs or plain file paths are accepted")]
    UnsupportedDatabaseUrl(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Settings for the OpenAI-compatible chat completions backend.
#[derive(Debug, Clone)]
pub struct AiSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub chat_model: String,
    pub extraction_model: String,
    pub timeout_secs: u64,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_AI_BASE_URL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            extraction_model: DEFAULT_EXTRACTION_MODEL.to_string(),
            timeout_secs: DEFAULT_AI_TIMEOUT_SECS,
        }
    }
}

/// Runtime configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct WorkbenchConfig {
    pub database_path: PathBuf,
    pub bind_addr: SocketAddr,
    pub cors_origins: Vec<String>,
    pub admin_password: String,
    pub ai: AiSettings,
}

impl WorkbenchConfig {
    /// Read configuration from the process environment.
    ///
    /// A `.env` file in the working directory is loaded first when present;
    /// variables already set in the environment take precedence.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env file");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let database_url = get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        let database_path = database_path_from_url(&database_url)?;

        let bind_raw = get("WORKBENCH_BIND").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse().map_err(|_| ConfigError::InvalidValue {
            key: "WORKBENCH_BIND",
            value: bind_raw.clone(),
        })?;

        let cors_origins = match get("WORKBENCH_CORS_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect(),
            None => DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
        };

        let timeout_secs = match get("AI_TIMEOUT_SECS") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "AI_TIMEOUT_SECS",
                value: raw.clone(),
            })?,
            None => DEFAULT_AI_TIMEOUT_SECS,
        };

        Ok(Self {
            database_path,
            bind_addr,
            cors_origins,
            admin_password: get("ADMIN_PASSWORD")
                .unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.to_string()),
            ai: AiSettings {
                api_key: get("AI_API_KEY"),
                base_url: get("AI_BASE_URL").unwrap_or_else(|| DEFAULT_AI_BASE_URL.to_string()),
                chat_model: get("AI_MODEL").unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
                extraction_model: get("AI_EXTRACTION_MODEL")
                    .unwrap_or_else(|| DEFAULT_EXTRACTION_MODEL.to_string()),
                timeout_secs,
            },
        })
    }

    /// Defaults only, pointing at the given database file.
    pub fn with_database(path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: path.into(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
            ai: AiSettings::default(),
        }
    }
}

/// Turn a `DATABASE_URL` into a filesystem path.
///
/// Accepts `sqlite:///relative/or/absolute`, `sqlite://path` and bare paths.
pub fn database_path_from_url(url: &str) -> Result<PathBuf, ConfigError> {
    if let Some(rest) = url.strip_prefix("sqlite:///") {
        // sqlite:///./x is relative, sqlite:////abs is absolute
        return Ok(PathBuf::from(rest));
    }
    if let Some(rest) = url.strip_prefix("sqlite://") {
        return Ok(PathBuf::from(rest));
    }
    if url.contains("://") {
        return Err(ConfigError::UnsupportedDatabaseUrl(url.to_string()));
    }
    Ok(PathBuf::from(url))
}
