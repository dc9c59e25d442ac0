use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{CredVaultError, Result};
use crate::session::SessionSettings;

/// Persisted session-lock configuration, loaded from `.credvault.toml`.
///
/// Every field has a default so the vault works with no config file at
/// all.  Values are validated on load and on save, so an out-of-range
/// timeout is rejected rather than silently clamped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Minutes of inactivity until the session hard-locks (default: 30).
    #[serde(default = "default_timeout_minutes")]
    pub timeout_minutes: u32,

    /// Minutes of warning before the hard lock (default: 5).
    #[serde(default = "default_warning_minutes")]
    pub warning_minutes: u32,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_timeout_minutes() -> u32 {
    30
}

fn default_warning_minutes() -> u32 {
    5
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            timeout_minutes: default_timeout_minutes(),
            warning_minutes: default_warning_minutes(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the data directory.
    const FILE_NAME: &'static str = ".credvault.toml";

    /// Load settings from `<data_dir>/.credvault.toml`.
    ///
    /// If the file does not exist, defaults are returned.  If the file
    /// exists but cannot be parsed, or holds out-of-range values, an
    /// error is returned.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let config_path = data_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            CredVaultError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        settings.session_settings().validate()?;
        Ok(settings)
    }

    /// Persist the settings to `<data_dir>/.credvault.toml`.
    ///
    /// Validates before writing; out-of-range values never reach disk.
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        self.session_settings().validate()?;

        let contents = toml::to_string_pretty(self)
            .map_err(|e| CredVaultError::SerializationError(format!("settings: {e}")))?;

        std::fs::write(self.path(data_dir), contents)?;
        Ok(())
    }

    /// Build the full path of the config file inside `data_dir`.
    pub fn path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(Self::FILE_NAME)
    }

    /// Convert into the session controller's configuration.
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            timeout_minutes: self.timeout_minutes,
            warning_minutes: self.warning_minutes,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
