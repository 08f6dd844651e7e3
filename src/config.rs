use std::fs;
use std::time::Duration;

use url::Url;

use crate::error::{EmbedError, EmbedResult};

pub const DEFAULT_API_BASE: &str = "https://api.domo.com";
pub const DEFAULT_CONTENT_BASE: &str = "https://public.domo.com";

/// Kind of embedded surface the provider should authorize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedType {
    Dashboard,
    Card,
}

impl EmbedType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmbedType::Dashboard => "dashboard",
            EmbedType::Card => "card",
        }
    }

    fn parse(raw: &str) -> EmbedResult<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "dashboard" => Ok(EmbedType::Dashboard),
            "card" => Ok(EmbedType::Card),
            other => Err(EmbedError::Config(format!(
                "unsupported EMBED_TYPE value '{other}'; expected 'dashboard' or 'card'"
            ))),
        }
    }
}

/// Static integration settings, loaded once at startup and passed by
/// reference into every component.
#[derive(Debug, Clone)]
pub struct EmbedConfig {
    pub client_id: String,
    pub client_secret: String,
    pub embed_id: String,
    pub embed_type: EmbedType,
    pub session_length_minutes: u32,
    pub permissions: Vec<String>,
    pub filter_column: String,
    pub filter_operator: String,
    pub customer_id_field: String,
    pub output_field: String,
    pub record_kind: String,
    pub api_base: String,
    pub content_base: String,
    pub http_timeout: Duration,
}

impl EmbedConfig {
    pub fn from_env() -> EmbedResult<Self> {
        let session_length_minutes = match optional_env("EMBED_SESSION_MINUTES") {
            Some(raw) => raw.parse::<u32>().map_err(|_| {
                EmbedError::Config(format!("EMBED_SESSION_MINUTES is not a number: '{raw}'"))
            })?,
            None => 60,
        };
        let http_timeout_secs = match optional_env("EMBED_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().map_err(|_| {
                EmbedError::Config(format!("EMBED_HTTP_TIMEOUT_SECS is not a number: '{raw}'"))
            })?,
            None => 10,
        };

        let config = Self {
            client_id: require_env("EMBED_CLIENT_ID")?,
            client_secret: require_secret_env("EMBED_CLIENT_SECRET", "EMBED_CLIENT_SECRET_FILE")?,
            embed_id: require_env("EMBED_ID")?,
            embed_type: EmbedType::parse(
                optional_env("EMBED_TYPE").as_deref().unwrap_or("dashboard"),
            )?,
            session_length_minutes,
            permissions: list_env("EMBED_PERMISSIONS", &["READ", "FILTER"]),
            filter_column: require_env("EMBED_FILTER_COLUMN")?,
            filter_operator: optional_env("EMBED_FILTER_OPERATOR")
                .unwrap_or_else(|| "EQUALS".to_string()),
            customer_id_field: require_env("EMBED_CUSTOMER_FIELD")?,
            output_field: require_env("EMBED_OUTPUT_FIELD")?,
            record_kind: optional_env("EMBED_RECORD_KIND")
                .unwrap_or_else(|| "customer".to_string()),
            api_base: optional_env("EMBED_API_BASE")
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            content_base: optional_env("EMBED_CONTENT_BASE")
                .unwrap_or_else(|| DEFAULT_CONTENT_BASE.to_string()),
            http_timeout: Duration::from_secs(http_timeout_secs),
        };
        config.validated()
    }

    /// Checks the invariants every component relies on. Called by
    /// `from_env` so a bad deployment fails before the first request.
    pub fn validated(mut self) -> EmbedResult<Self> {
        if self.client_id.is_empty() || self.client_secret.is_empty() {
            return Err(EmbedError::Config(
                "client id and client secret must be non-empty".into(),
            ));
        }
        if self.embed_id.is_empty() {
            return Err(EmbedError::Config("embed id must be non-empty".into()));
        }
        if self.session_length_minutes == 0 {
            return Err(EmbedError::Config(
                "session length must be a positive number of minutes".into(),
            ));
        }
        if self.filter_column.is_empty() || self.filter_operator.is_empty() {
            return Err(EmbedError::Config(
                "filter column and operator must be non-empty".into(),
            ));
        }
        self.api_base = checked_base_url("api base", &self.api_base)?;
        self.content_base = checked_base_url("content base", &self.content_base)?;
        Ok(self)
    }
}

fn checked_base_url(name: &str, raw: &str) -> EmbedResult<String> {
    let trimmed = raw.trim_end_matches('/');
    Url::parse(trimmed)
        .map_err(|err| EmbedError::Config(format!("invalid {name} URL '{trimmed}': {err}")))?;
    Ok(trimmed.to_string())
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn require_env(key: &str) -> EmbedResult<String> {
    optional_env(key).ok_or_else(|| EmbedError::Config(format!("{key} must be set")))
}

/// Reads a secret either directly or from a file path, file taking
/// precedence so deployments can mount the value.
fn require_secret_env(value_key: &str, file_key: &str) -> EmbedResult<String> {
    if let Some(path) = optional_env(file_key) {
        let contents = fs::read_to_string(&path).map_err(|err| {
            EmbedError::Config(format!("failed to read {file_key} from {path}: {err}"))
        })?;
        let trimmed = contents.trim().to_string();
        if !trimmed.is_empty() {
            return Ok(trimmed);
        }
    }
    require_env(value_key)
}

fn list_env(key: &str, default_values: &[&str]) -> Vec<String> {
    optional_env(key)
        .map(|value| {
            value
                .split(',')
                .filter_map(|raw| {
                    let trimmed = raw.trim();
                    if trimmed.is_empty() {
                        None
                    } else {
                        Some(trimmed.to_string())
                    }
                })
                .collect::<Vec<_>>()
        })
        .filter(|values| !values.is_empty())
        .unwrap_or_else(|| default_values.iter().map(|v| v.to_string()).collect())
}
