//! Run configuration.
//!
//! Credentials come from the environment (a `.env` file is loaded by the
//! binary beforehand):
//!
//! - `CHURCHTOOLS_DOMAIN`: host name of the ChurchTools instance
//! - `CHURCHTOOLS_LOGIN_TOKEN`: login token of the API user
//! - `CHURCHREPORT_DEBUG_CACHE`: set to `1`/`true` to enable the roster cache
//!
//! The debug cache lives under the platform cache directory, e.g.
//! `~/.cache/churchreport/`.

use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application name used for cache directory paths
const APP_NAME: &str = "churchreport";

const ENV_DOMAIN: &str = "CHURCHTOOLS_DOMAIN";
const ENV_LOGIN_TOKEN: &str = "CHURCHTOOLS_LOGIN_TOKEN";
const ENV_DEBUG_CACHE: &str = "CHURCHREPORT_DEBUG_CACHE";

/// Where the API lives and how to authenticate against it.
#[derive(Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub login_token: String,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("login_token", &"<redacted>")
            .finish()
    }
}

impl ApiConfig {
    /// Build from a bare domain (`example.church.tools`) or a full URL.
    pub fn new(domain: &str, login_token: impl Into<String>) -> Self {
        let domain = domain.trim().trim_end_matches('/');
        let base_url = if domain.starts_with("http://") || domain.starts_with("https://") {
            if domain.ends_with("/api") {
                domain.to_string()
            } else {
                format!("{}/api", domain)
            }
        } else {
            format!("https://{}/api", domain)
        };

        Self {
            base_url,
            login_token: login_token.into(),
        }
    }

    pub fn from_env() -> Result<Self> {
        let domain = std::env::var(ENV_DOMAIN)
            .with_context(|| format!("{} is not set", ENV_DOMAIN))?;
        let token = std::env::var(ENV_LOGIN_TOKEN)
            .with_context(|| format!("{} is not set", ENV_LOGIN_TOKEN))?;
        Ok(Self::new(&domain, token))
    }

    /// Absolute URL for an API path such as `persons/12/relationships`
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Settings for one report run
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub debug_cache: bool,
    pub cache_dir: Option<PathBuf>,
}

impl Config {
    /// Settings from the environment; command-line flags are applied on top
    /// by the caller.
    pub fn from_env() -> Self {
        let debug_cache = std::env::var(ENV_DEBUG_CACHE)
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Self {
            debug_cache,
            cache_dir: None,
        }
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.cache_dir {
            return Ok(dir.clone());
        }
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}
