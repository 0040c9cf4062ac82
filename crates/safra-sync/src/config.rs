//! # Sync Configuration
//!
//! Configuration management for the sync engine.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     SAFRA_REMOTE_URL=https://example.supabase.co/rest/v1               │
//! │     SAFRA_REMOTE_API_KEY=...                                           │
//! │     SAFRA_SYNC_ENABLED=false                                           │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/safra/sync.toml (Linux)                                  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     remote disabled until a base URL is configured                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # sync.toml
//! [remote]
//! base_url = "https://example.supabase.co/rest/v1"
//! api_key = "service-key-here"   # optional
//! timeout_secs = 10
//! enabled = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use url::Url;

use crate::error::{SyncError, SyncResult};

// =============================================================================
// Remote Configuration
// =============================================================================

/// Configuration for the remote record store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the remote table API (PostgREST-style).
    #[serde(default)]
    pub base_url: String,

    /// Optional API key sent with every request.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Per-call deadline in seconds. A call that exceeds it is treated the
    /// same as the remote being unavailable.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Master switch for the remote side. With this off the ledger is
    /// local-only and every record simply stays `Unsynced`.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_enabled() -> bool {
    true
}

impl Default for RemoteConfig {
    fn default() -> Self {
        RemoteConfig {
            base_url: String::new(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            enabled: default_enabled(),
        }
    }
}

// =============================================================================
// Sync Configuration
// =============================================================================

/// Top-level sync configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub remote: RemoteConfig,
}

impl SyncConfig {
    /// True when a remote endpoint is configured and enabled.
    ///
    /// An unconfigured remote is not an error; it is the out-of-the-box
    /// state, in which Safra works purely off the local store.
    pub fn is_remote_enabled(&self) -> bool {
        self.remote.enabled && !self.remote.base_url.trim().is_empty()
    }

    /// Parses and returns the remote base URL.
    pub fn remote_url(&self) -> SyncResult<Url> {
        Url::parse(self.remote.base_url.trim()).map_err(SyncError::from)
    }

    /// Per-call deadline as a Duration.
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.remote.timeout_secs)
    }

    /// Validates the configuration.
    ///
    /// Only meaningful when the remote side is enabled: the base URL must
    /// parse and the deadline must be non-zero.
    pub fn validate(&self) -> SyncResult<()> {
        if !self.is_remote_enabled() {
            return Ok(());
        }

        self.remote_url()?;

        if self.remote.timeout_secs == 0 {
            return Err(SyncError::Config(
                "timeout_secs must be greater than zero".into(),
            ));
        }

        Ok(())
    }

    // =========================================================================
    // Loading / Saving
    // =========================================================================

    /// Default config file location (`~/.config/safra/sync.toml` on Linux).
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "safra")
            .map(|dirs| dirs.config_dir().join("sync.toml"))
    }

    /// Loads the configuration from `path` (or the default location), then
    /// applies environment overrides.
    ///
    /// A missing file yields the defaults, since first run is not an error. A
    /// file that exists but fails to parse IS an error: silently ignoring a
    /// typo in the remote URL would look exactly like being offline.
    pub fn load_or_default(path: Option<&Path>) -> SyncResult<Self> {
        let resolved = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Self::default_path(),
        };

        let mut config = match resolved {
            Some(ref p) if p.exists() => {
                debug!(path = %p.display(), "loading sync configuration");
                let raw = std::fs::read_to_string(p)?;
                toml::from_str(&raw)?
            }
            Some(ref p) => {
                debug!(path = %p.display(), "no sync configuration file, using defaults");
                SyncConfig::default()
            }
            None => {
                warn!("no config directory available, using defaults");
                SyncConfig::default()
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Applies `SAFRA_*` environment overrides on top of whatever was
    /// loaded from disk.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("SAFRA_REMOTE_URL") {
            self.remote.base_url = url;
        }
        if let Ok(key) = std::env::var("SAFRA_REMOTE_API_KEY") {
            self.remote.api_key = Some(key);
        }
        if let Ok(raw) = std::env::var("SAFRA_SYNC_ENABLED") {
            match raw.parse::<bool>() {
                Ok(enabled) => self.remote.enabled = enabled,
                Err(_) => warn!(value = %raw, "ignoring non-boolean SAFRA_SYNC_ENABLED"),
            }
        }
    }

    /// Writes the configuration to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> SyncResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = toml::to_string_pretty(self)?;
        std::fs::write(path, raw)?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_local_only() {
        let config = SyncConfig::default();
        assert!(!config.is_remote_enabled());
        assert_eq!(config.remote.timeout_secs, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let config: SyncConfig = toml::from_str(
            r#"
            [remote]
            base_url = "https://example.supabase.co/rest/v1"
            api_key = "key-123"
            timeout_secs = 5
            "#,
        )
        .unwrap();

        assert!(config.is_remote_enabled());
        assert_eq!(config.remote.api_key.as_deref(), Some("key-123"));
        assert_eq!(config.timeout(), std::time::Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_url_and_zero_timeout() {
        let mut config = SyncConfig::default();
        config.remote.base_url = "not a url".into();
        assert!(matches!(config.validate(), Err(SyncError::InvalidUrl(_))));

        config.remote.base_url = "https://example.com/rest/v1".into();
        config.remote.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(SyncError::Config(_))));
    }

    #[test]
    fn test_load_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sync.toml");
        let config = SyncConfig::load_or_default(Some(&path)).unwrap();
        assert!(!config.is_remote_enabled());
    }

    #[test]
    fn test_load_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sync.toml");
        std::fs::write(&path, "[remote\nbase_url = oops").unwrap();
        assert!(matches!(
            SyncConfig::load_or_default(Some(&path)),
            Err(SyncError::Config(_))
        ));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("sync.toml");

        let mut config = SyncConfig::default();
        config.remote.base_url = "https://example.com/rest/v1".into();
        config.save(&path).unwrap();

        let loaded = SyncConfig::load_or_default(Some(&path)).unwrap();
        assert_eq!(loaded.remote.base_url, "https://example.com/rest/v1");
    }
}
