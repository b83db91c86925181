//! Configuration for the ingestion tool

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Encoded text size above which a document is chunked instead of batched
pub const MAX_DOCUMENT_SIZE: usize = 350 * 1024;

/// How far the chunker looks back for a space when realigning a cut
pub const BOUNDARY_SCAN_LIMIT: usize = 100;

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IngestConfig {
    /// Remote document store connection
    #[serde(default)]
    pub store: StoreConfig,
    /// File ingestion behaviour
    #[serde(default)]
    pub ingestion: IngestionConfig,
    /// Search behaviour
    #[serde(default)]
    pub search: SearchConfig,
}

impl IngestConfig {
    /// Default config file location
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ruvector-ingest")
            .join("config.toml")
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the default location is
    /// read when present and defaults are used otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = Self::default_path();
                if default.is_file() {
                    Self::from_file(&default)?
                } else {
                    tracing::debug!("No config at {}, using defaults", default.display());
                    Self::default()
                }
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&raw)
    }

    /// Parse TOML text
    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Reject settings the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.ingestion.max_document_size == 0 {
            return Err(Error::Config("ingestion.max_document_size must be > 0".into()));
        }
        if self.store.endpoint.trim().is_empty() {
            return Err(Error::Config("store.endpoint must not be empty".into()));
        }
        Ok(())
    }
}

/// Remote store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the document store
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// API path prefix
    #[serde(default = "default_api_path")]
    pub api_path: String,
    /// Bearer token sent with every request
    #[serde(default)]
    pub jwt: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_endpoint() -> String {
    "https://paraio.com".to_string()
}

fn default_api_path() -> String {
    "v1".to_string()
}

fn default_timeout() -> u64 { 30 }
fn default_max_retries() -> u32 { 2 }

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_path: default_api_path(),
            jwt: None,
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

/// File ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Maximum encoded text size of one record, and of one batch
    #[serde(default = "default_max_document_size")]
    pub max_document_size: usize,
    /// Backward scan limit when aligning chunk cuts to spaces
    #[serde(default = "default_boundary_scan_limit")]
    pub boundary_scan_limit: usize,
    /// Base64-encode identifiers before using them as storage keys
    #[serde(default = "default_encode_ids")]
    pub encode_ids: bool,
    /// Strip leading boilerplate from extracted text
    #[serde(default)]
    pub sanitize: bool,
    /// Media type assumed when the extension is unknown
    #[serde(default = "default_media_type")]
    pub default_media_type: String,
}

fn default_max_document_size() -> usize { MAX_DOCUMENT_SIZE }
fn default_boundary_scan_limit() -> usize { BOUNDARY_SCAN_LIMIT }
fn default_encode_ids() -> bool { true }

fn default_media_type() -> String {
    "text/plain".to_string()
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            max_document_size: MAX_DOCUMENT_SIZE,
            boundary_scan_limit: BOUNDARY_SCAN_LIMIT,
            encode_ids: true,
            sanitize: false,
            default_media_type: default_media_type(),
        }
    }
}

/// Search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Sort key used when fetching every page
    #[serde(default = "default_page_all_sort_key")]
    pub page_all_sort_key: String,
    /// Page size when the caller gives none
    #[serde(default)]
    pub default_limit: Option<u32>,
}

fn default_page_all_sort_key() -> String {
    "_docid".to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            page_all_sort_key: default_page_all_sort_key(),
            default_limit: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = IngestConfig::default();
        assert_eq!(config.ingestion.max_document_size, 350 * 1024);
        assert_eq!(config.ingestion.boundary_scan_limit, 100);
        assert!(config.ingestion.encode_ids);
        assert!(!config.ingestion.sanitize);
        assert_eq!(config.search.page_all_sort_key, "_docid");
        assert_eq!(config.store.endpoint, "https://paraio.com");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config = IngestConfig::from_toml(
            r#"
            [store]
            endpoint = "http://localhost:8080"
            jwt = "token"

            [ingestion]
            encode_ids = false
            "#,
        )
        .unwrap();

        assert_eq!(config.store.endpoint, "http://localhost:8080");
        assert_eq!(config.store.jwt.as_deref(), Some("token"));
        assert_eq!(config.store.api_path, "v1");
        assert!(!config.ingestion.encode_ids);
        assert_eq!(config.ingestion.max_document_size, MAX_DOCUMENT_SIZE);
    }

    #[test]
    fn test_unknown_store_keys_are_ignored() {
        let config = IngestConfig::from_toml(
            r#"
            [store]
            access_key = "app:demo"
            secret_key = "s3cr3t"
            "#,
        )
        .unwrap();
        assert_eq!(config.store.endpoint, "https://paraio.com");
        assert!(config.store.jwt.is_none());
    }

    #[test]
    fn test_validate_rejects_zero_size() {
        let mut config = IngestConfig::default();
        config.ingestion.max_document_size = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_explicit_file() {
        let result = IngestConfig::load(Some(Path::new("/definitely/not/here.toml")));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
