//! Lens configuration.
//!
//! Configuration lives in `lens.toml` (path override via `--config` /
//! `LENS_CONFIG`). Every field has a default so a missing or partial file
//! still yields a working daemon. The admin allow-list is injected here
//! rather than hardcoded anywhere, so tests and deployments can substitute
//! their own.

use crate::gateway::{InferenceConfig, DEFAULT_ENDPOINT, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

const CONFIG_FILE: &str = "lens.toml";
const DB_FILE: &str = "lens.db";

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Address the daemon binds to. Localhost only by default.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_bind_addr() -> String {
    "127.0.0.1:7810".to_string()
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

/// Inference service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceSettings {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// API key. Falls back to the `ANTHROPIC_API_KEY` environment variable
    /// when unset.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl InferenceSettings {
    /// Resolve into the gateway's config, applying the env fallback.
    pub fn to_inference_config(&self) -> InferenceConfig {
        InferenceConfig {
            endpoint: self.endpoint.clone(),
            model: self.model.clone(),
            api_key: self
                .api_key
                .clone()
                .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
                .unwrap_or_default(),
            timeout_secs: self.timeout_secs,
        }
    }
}

/// Storage settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageSettings {
    /// SQLite database path. Defaults to the user data directory.
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

impl StorageSettings {
    pub fn resolved_db_path(&self) -> PathBuf {
        self.db_path.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("lens")
                .join(DB_FILE)
        })
    }
}

/// Administrative access settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminSettings {
    /// Identifiers (emails) allowed to call admin operations.
    #[serde(default)]
    pub emails: Vec<String>,
}

impl AdminSettings {
    /// Case-insensitive allow-list membership check.
    pub fn is_admin(&self, identity: &str) -> bool {
        if identity.is_empty() {
            return false;
        }
        let needle = identity.to_lowercase();
        self.emails.iter().any(|e| e.to_lowercase() == needle)
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LensConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub inference: InferenceSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub admin: AdminSettings,
}

impl LensConfig {
    /// Load from an explicit path, or from `lens.toml` in the working
    /// directory. Missing or unparseable files yield defaults.
    pub fn load(path: Option<&Path>) -> Self {
        let path = path
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));

        match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => config,
                Err(e) => {
                    warn!("[CONFIG]  Failed to parse {:?}, using defaults: {}", path, e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_check_is_case_insensitive() {
        let admin = AdminSettings {
            emails: vec!["Ops@Lens.example".to_string()],
        };
        assert!(admin.is_admin("ops@lens.example"));
        assert!(admin.is_admin("OPS@LENS.EXAMPLE"));
        assert!(!admin.is_admin("someone@lens.example"));
        assert!(!admin.is_admin(""));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: LensConfig = toml::from_str(
            r#"
            [admin]
            emails = ["ops@lens.example"]
            "#,
        )
        .unwrap();
        assert_eq!(config.server.bind_addr, "127.0.0.1:7810");
        assert_eq!(config.inference.model, crate::gateway::DEFAULT_MODEL);
        assert!(config.admin.is_admin("ops@lens.example"));
    }
}
