//! Per-profile configuration for twoot-sync
//!
//! A profile names one (Mastodon account, Twitter account) credential pair.
//! Profiles are created by an external setup flow and are read-only here.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ConfigError, Result};

fn default_max_twoots() -> usize {
    1000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub mastodon: MastodonConfig,
    pub twitter: TwitterConfig,

    /// Retention limit for stored toot/tweet mappings.
    #[serde(default = "default_max_twoots")]
    pub max_twoots: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MastodonConfig {
    /// Instance base URL, e.g. "https://mastodon.social"
    pub api_base_url: String,
    pub access_token: String,

    // OAuth app credentials left behind by the setup flow; unused at runtime.
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
}

/// Destination credentials and endpoints.
///
/// The token is sent as a `Bearer` credential on every request. Endpoints
/// that insist on OAuth 1.0a request signing need a signing proxy in front;
/// point `api_base_url` and `upload_base_url` at it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwitterConfig {
    pub access_token: String,

    #[serde(default = "default_twitter_api_base")]
    pub api_base_url: String,

    #[serde(default = "default_twitter_upload_base")]
    pub upload_base_url: String,
}

fn default_twitter_api_base() -> String {
    "https://api.twitter.com".to_string()
}

fn default_twitter_upload_base() -> String {
    "https://upload.twitter.com".to_string()
}

impl Profile {
    /// Load the named profile from the config directory
    pub fn load(name: &str) -> Result<Self> {
        let path = resolve_config_dir()?.join(format!("{}.toml", name));
        Self::load_from_path(&path)
    }

    /// Load a profile from a specific path
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let profile: Profile = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(profile)
    }
}

/// Resolve the configuration directory following the XDG Base Directory spec
pub fn resolve_config_dir() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("TWOOT_CONFIG_DIR") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("twoot-sync"))
}

/// Resolve the data directory (persisted markers/mappings, lock file)
pub fn resolve_data_dir() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("TWOOT_DATA_DIR") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let data_dir = dirs::data_dir()
        .ok_or_else(|| ConfigError::MissingField("data directory".to_string()))?;

    Ok(data_dir.join("twoot-sync"))
}
