//! Configuration file support for Pillbox.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/pillbox/config.toml`.

use crate::{Error, PillboxState, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub preferences: PreferencesConfig,

    #[serde(default)]
    pub email: EmailConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Preferences used to seed a brand-new state file
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PreferencesConfig {
    #[serde(default = "default_play_sounds")]
    pub play_sounds: bool,

    #[serde(default)]
    pub history_reverse: bool,
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            play_sounds: default_play_sounds(),
            history_reverse: false,
        }
    }
}

/// Email defaults
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default)]
    pub recipient: Option<String>,

    #[serde(default = "default_recent_days")]
    pub recent_days: i64,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            recipient: None,
            recent_days: default_recent_days(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("pillbox")
}

fn default_play_sounds() -> bool {
    true
}

fn default_recent_days() -> i64 {
    30
}

/// Upper bound on `email.recent_days` (about a century)
pub const MAX_RECENT_DAYS: i64 = 36_500;

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("pillbox").join("config.toml")
    }

    fn validate(&self) -> Result<()> {
        if !(1..=MAX_RECENT_DAYS).contains(&self.email.recent_days) {
            return Err(Error::Config(format!(
                "email.recent_days must be between 1 and {}, got {}",
                MAX_RECENT_DAYS, self.email.recent_days
            )));
        }
        Ok(())
    }

    /// State used when no state file exists yet
    pub fn initial_state(&self) -> PillboxState {
        PillboxState {
            history_is_reverse: self.preferences.history_reverse,
            play_sounds: self.preferences.play_sounds,
            ..PillboxState::default()
        }
    }

    pub fn state_path(&self) -> PathBuf {
        self.data.data_dir.join("state.json")
    }

    pub fn outbox_path(&self) -> PathBuf {
        self.data.data_dir.join("outbox.jsonl")
    }
}
