//! Configuration for the ingest and chat programs
//!
//! Both programs are configured from environment variables. Each config type
//! exposes `from_env()` plus `from_lookup()`, which takes any key lookup so
//! callers (and tests) can supply values without touching the process env.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::ingestion::DEFAULT_LIMIT;

/// Default keyspace holding the post table
pub const DEFAULT_KEYSPACE: &str = "default_keyspace";
/// Table receiving normalized posts
pub const DEFAULT_TABLE: &str = "post_analysis_data";
/// Hosted workflow API
pub const DEFAULT_LANGFLOW_BASE_URL: &str = "https://api.langflow.astra.datastax.com";
/// Workflow endpoint name
pub const DEFAULT_LANGFLOW_ENDPOINT: &str = "SocialMedia";

/// Ingestion run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Spreadsheet or CSV export to load (`EXCEL_FILE_PATH`)
    pub source_path: PathBuf,
    /// Maximum rows loaded per run (`INGEST_LIMIT`, default: 200)
    pub limit: usize,
    /// Directory receiving the CSV archive (`ARCHIVE_DIR`, default: ".")
    pub archive_dir: PathBuf,
    /// Create keyspace/table before loading (`INGEST_SETUP_SCHEMA`, default: false)
    pub setup_schema: bool,
    /// Table store configuration
    pub store: StoreConfig,
}

impl IngestConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    /// Load from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source_path = lookup("EXCEL_FILE_PATH")
            .map(PathBuf::from)
            .ok_or_else(|| Error::config("EXCEL_FILE_PATH is not set"))?;

        let limit = match lookup("INGEST_LIMIT") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|_| Error::config(format!("INGEST_LIMIT must be a non-negative integer, got '{raw}'")))?,
            None => DEFAULT_LIMIT,
        };

        let setup_schema = match lookup("INGEST_SETUP_SCHEMA") {
            Some(raw) => parse_bool("INGEST_SETUP_SCHEMA", &raw)?,
            None => false,
        };

        Ok(Self {
            source_path,
            limit,
            archive_dir: lookup("ARCHIVE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            setup_schema,
            store: StoreConfig::from_lookup(&lookup)?,
        })
    }
}

/// Which table store backend receives the records
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Hosted Astra DB through its Data API
    #[default]
    Astra,
    /// Local SQLite file
    Sqlite,
}

impl FromStr for StoreBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "astra" => Ok(Self::Astra),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(Error::config(format!(
                "unknown store backend '{other}' (expected 'astra' or 'sqlite')"
            ))),
        }
    }
}

/// Table store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend provider (`STORE_BACKEND`, default: astra)
    #[serde(default)]
    pub backend: StoreBackend,
    /// Keyspace (`ASTRA_DB_KEYSPACE`, default: "default_keyspace")
    pub keyspace: String,
    /// Target table
    pub table: String,
    /// Astra connection (required when backend = astra)
    #[serde(default)]
    pub astra: Option<AstraConfig>,
    /// SQLite database path (`SQLITE_PATH`, default: "post_analysis.db")
    pub sqlite_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            keyspace: DEFAULT_KEYSPACE.to_string(),
            table: DEFAULT_TABLE.to_string(),
            astra: None,
            sqlite_path: PathBuf::from("post_analysis.db"),
        }
    }
}

impl StoreConfig {
    fn from_lookup<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let backend = match lookup("STORE_BACKEND") {
            Some(raw) => raw.parse::<StoreBackend>()?,
            None => defaults.backend,
        };

        let astra = match (
            lookup("ASTRA_DB_API_ENDPOINT"),
            lookup("ASTRA_DB_APPLICATION_TOKEN"),
        ) {
            (Some(api_endpoint), Some(token)) => Some(AstraConfig {
                api_endpoint: api_endpoint.trim_end_matches('/').to_string(),
                token,
            }),
            _ => None,
        };

        Ok(Self {
            backend,
            keyspace: lookup("ASTRA_DB_KEYSPACE").unwrap_or(defaults.keyspace),
            table: defaults.table,
            astra,
            sqlite_path: lookup("SQLITE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.sqlite_path),
        })
    }

    /// Check that the selected backend has what it needs.
    ///
    /// Called when the store is opened, after any command-line overrides.
    pub fn validate(&self) -> Result<()> {
        if self.backend == StoreBackend::Astra && self.astra.is_none() {
            return Err(Error::config(
                "ASTRA_DB_API_ENDPOINT and ASTRA_DB_APPLICATION_TOKEN must be set for the astra backend",
            ));
        }
        Ok(())
    }
}

/// Astra DB Data API connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AstraConfig {
    /// Database API endpoint, e.g. "https://<id>-<region>.apps.astra.datastax.com"
    pub api_endpoint: String,
    /// Application token ("AstraCS:...")
    pub token: String,
}

/// Chat client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Workflow API base URL (`LANGFLOW_BASE_URL`)
    pub base_url: String,
    /// Langflow project id (`LANGFLOW_ID`)
    pub langflow_id: String,
    /// Flow endpoint name (`LANGFLOW_ENDPOINT`, default: "SocialMedia")
    pub endpoint: String,
    /// Bearer token (`APPLICATION_TOKEN`)
    pub application_token: String,
    /// Request timeout in seconds (`LANGFLOW_TIMEOUT_SECS`); no timeout when unset
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl ChatConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    /// Load from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let timeout_secs = match lookup("LANGFLOW_TIMEOUT_SECS") {
            Some(raw) => Some(raw.trim().parse::<u64>().map_err(|_| {
                Error::config(format!("LANGFLOW_TIMEOUT_SECS must be whole seconds, got '{raw}'"))
            })?),
            None => None,
        };

        Ok(Self {
            base_url: lookup("LANGFLOW_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_LANGFLOW_BASE_URL.to_string()),
            langflow_id: lookup("LANGFLOW_ID")
                .ok_or_else(|| Error::config("LANGFLOW_ID is not set"))?,
            endpoint: lookup("LANGFLOW_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_LANGFLOW_ENDPOINT.to_string()),
            application_token: lookup("APPLICATION_TOKEN")
                .ok_or_else(|| Error::config("APPLICATION_TOKEN is not set"))?,
            timeout_secs,
        })
    }

    /// Full run URL for the configured flow
    pub fn run_url(&self) -> String {
        format!(
            "{}/lf/{}/api/v1/run/{}",
            self.base_url, self.langflow_id, self.endpoint
        )
    }
}

/// Environment lookup that treats empty values as unset
pub fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::config(format!("{key} must be a boolean, got '{raw}'"))),
    }
}
