//! Site configuration.
//!
//! Settings are read from a JSON file; every field is optional. Lookup order:
//! an explicit path, `./scholarpage.json`, then
//! `<config dir>/scholarpage/config.json`. Without any file the defaults apply.

use crate::classify::Category;
use crate::error::{Result, ScholarPageError};
use crate::fetch::FetchOptions;
use crate::page::TargetIds;
use crate::source::DataSource;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Config file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "scholarpage.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Site root holding `data/<source>/`; the working directory when unset
    pub feed_base: Option<String>,
    pub source: DataSource,
    /// Category for pages whose mount point does not name one
    pub category: Category,
    /// Author id restriction overriding the mount point attribute
    pub identity_token: Option<String>,
    /// Name fragments identifying the site owner in author lists
    pub highlight: Vec<String>,
    pub targets: TargetIds,
    pub cache_bust: bool,
    /// Transport timeout in seconds; none when unset
    pub timeout_secs: Option<u64>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            feed_base: None,
            source: DataSource::default(),
            category: Category::default(),
            identity_token: None,
            highlight: Vec::new(),
            targets: TargetIds::default(),
            cache_bust: true,
            timeout_secs: None,
        }
    }
}

/// Default user-level config path: `<config dir>/scholarpage/config.json`
fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("scholarpage").join("config.json"))
}

impl SiteConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| ScholarPageError::Config(format!("{}: {}", path.display(), e)))?;
        info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Load from `explicit`, or the first config file found, or defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_path(path);
        }

        let candidates = std::iter::once(PathBuf::from(LOCAL_CONFIG_FILE)).chain(user_config_path());
        for path in candidates {
            if path.exists() {
                return Self::from_path(&path);
            }
        }

        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Site root as a URL; plain paths are taken relative to the working
    /// directory.
    pub fn feed_base_url(&self) -> Result<Url> {
        let raw = self.feed_base.as_deref().map(str::trim).unwrap_or("");

        if raw.contains("://") {
            return Url::parse(raw)
                .map_err(|e| ScholarPageError::Config(format!("Invalid feed_base '{}': {}", raw, e)));
        }

        let cwd = std::env::current_dir()?;
        let dir = if raw.is_empty() { cwd } else { cwd.join(raw) };
        Url::from_directory_path(&dir)
            .map_err(|_| ScholarPageError::Config(format!("Invalid feed directory: {}", dir.display())))
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            cache_bust: self.cache_bust,
            timeout: self.timeout_secs.map(|secs| Duration::from_secs(secs.max(1))),
        }
    }
}
