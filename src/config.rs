use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::credential::Credential;

/// Environment variable consulted when no key is configured elsewhere.
pub const API_KEY_ENV: &str = "SENSAY_API_KEY";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote API connection settings
    pub api: ApiConfig,

    /// Demo user and replica provisioned on first use
    pub demo: DemoConfig,

    /// Interactive front-end preferences
    pub ui: UiConfig,
}

/// Replica API connection settings
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_version: String,
    pub organization_secret: Option<String>,
    /// No timeout beyond the transport default when unset.
    pub request_timeout_secs: Option<u64>,
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field(
                "organization_secret",
                &self.organization_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.sensay.io".to_string(),
            api_version: "2025-03-25".to_string(),
            organization_secret: None,
            request_timeout_secs: None,
        }
    }
}

/// Fixed identity of the demo user and replica
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub user_id: String,
    pub user_name: String,
    /// Derived from `user_id` when unset.
    pub user_email: Option<String>,
    pub replica_name: String,
    pub replica_description: String,
    pub replica_greeting: String,
    pub replica_slug: String,
    pub model: String,
    pub memory_mode: String,
    pub system_message: String,
    /// Source tag attached to every completion request
    pub completion_source: String,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            user_id: "sample-user".to_string(),
            user_name: "Sample User".to_string(),
            user_email: None,
            replica_name: "Sample Replica".to_string(),
            replica_description: "A helpful assistant for demonstration purposes".to_string(),
            replica_greeting: "Hello! I'm a sample replica. How can I help you today?".to_string(),
            replica_slug: "sample-replica".to_string(),
            model: "claude-3-7-sonnet-latest".to_string(),
            memory_mode: "prompt-caching".to_string(),
            system_message: "You are a helpful AI assistant that provides clear and concise responses."
                .to_string(),
            completion_source: "web".to_string(),
        }
    }
}

impl DemoConfig {
    pub fn user_email(&self) -> String {
        self.user_email
            .clone()
            .unwrap_or_else(|| format!("{}@example.com", self.user_id))
    }
}

/// UI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Start with the API key shown in full instead of masked
    pub show_credential: bool,
}

impl Config {
    /// Directory holding the config file (`~/.replica-chat`)
    pub fn home() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        Ok(home.join(".replica-chat"))
    }

    pub fn path() -> Result<PathBuf> {
        Ok(Self::home()?.join("config.toml"))
    }

    /// Load configuration from the default location, falling back to defaults
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Resolve the API key: explicit flag, then config file, then environment
    pub fn resolve_credential(&self, flag: Option<&str>) -> Option<Credential> {
        flag.and_then(Credential::new)
            .or_else(|| self.api.organization_secret.as_deref().and_then(Credential::new))
            .or_else(|| std::env::var(API_KEY_ENV).ok().and_then(Credential::new))
    }
}
