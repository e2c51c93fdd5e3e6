use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::collab::{DEFAULT_FILE_PREFIX, DEFAULT_HISTORY_LIMIT, PreferenceStore};
use crate::policy::PresetId;
use crate::rewrite::RewriteOptions;
use crate::taxonomy::Tag;

/// Top-level configuration for the metastrip library.
///
/// Controls the default cleaning policy, where cleaned copies go, which
/// fields must always survive, and whether results are kept in a history
/// file.
///
/// # Loading
///
/// ```rust,no_run
/// use metastrip::config::Config;
///
/// // From a JSON file
/// let config = Config::load(Some("config.json".as_ref())).unwrap();
///
/// // Or use defaults and customize
/// let mut config = Config::default();
/// config.preferences.default_preset = "SOCIAL_SAFE".into();
/// config.output.output_dir = "/tmp/cleaned".into();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Default policy and save mode.
    pub preferences: Preferences,
    /// Where and how cleaned copies are written.
    pub output: OutputConfig,
    /// Rewrite engine behavior.
    pub rewrite: RewriteConfig,
    /// Cleaning history persistence.
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    /// Preset identifier, e.g. `"ANONYMOUS"` or `"social-safe"`.
    pub default_preset: String,
    /// If `true`, write cleaned copies. If `false`, overwrite originals.
    pub save_as_copy: bool,
}

/// Output behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for cleaned copies, created on first use.
    pub output_dir: PathBuf,
    /// File name prefix for cleaned copies.
    pub file_prefix: String,
    /// Files cleaned concurrently in a batch.
    pub max_parallel: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewriteConfig {
    /// Fields never removed, whatever the policy says.
    #[serde(default)]
    pub preserve_tags: Vec<Tag>,
    /// Re-read each cleaned file and fail it if GPS data survived.
    pub verify_gps_removal: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryConfig {
    pub enabled: bool,
    /// History file. `None` uses `history.json` next to the config file.
    pub path: Option<PathBuf>,
    /// Entries kept, newest first.
    pub limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            preferences: Preferences {
                default_preset: PresetId::Anonymous.as_str().to_string(),
                save_as_copy: true,
            },
            output: OutputConfig {
                output_dir: PathBuf::from("cleaned"),
                file_prefix: DEFAULT_FILE_PREFIX.to_string(),
                max_parallel: 4,
            },
            rewrite: RewriteConfig {
                preserve_tags: Vec::new(),
                verify_gps_removal: true,
            },
            history: HistoryConfig {
                enabled: false,
                path: None,
                limit: DEFAULT_HISTORY_LIMIT,
            },
        }
    }
}

impl Config {
    /// Resolve the config file path, in the same directory as the executable.
    pub fn config_path() -> Result<PathBuf> {
        let exe_path = std::env::current_exe().context("Failed to get executable path")?;
        let exe_dir = exe_path
            .parent()
            .context("Failed to get executable directory")?;
        Ok(exe_dir.join("config.json"))
    }

    /// Load config from the given path, or from the default location.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            log::warn!(
                "Config file not found at {}. Using defaults.",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Save config to the given path, or to the default location.
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, contents).context("Failed to write config file")?;
        log::info!("Config saved to {}", config_path.display());
        Ok(())
    }

    pub fn rewrite_options(&self) -> RewriteOptions {
        RewriteOptions {
            preserve: self.rewrite.preserve_tags.clone(),
            verify_gps_removal: self.rewrite.verify_gps_removal,
        }
    }

    /// History file location, or `None` when history is disabled.
    pub fn history_path(&self) -> Result<Option<PathBuf>> {
        if !self.history.enabled {
            return Ok(None);
        }
        match &self.history.path {
            Some(p) => Ok(Some(p.clone())),
            None => {
                let config_path = Self::config_path()?;
                let dir = config_path
                    .parent()
                    .context("Failed to get config directory")?;
                Ok(Some(dir.join("history.json")))
            }
        }
    }
}

impl PreferenceStore for Config {
    fn default_preset(&self) -> String {
        self.preferences.default_preset.clone()
    }

    fn save_as_copy(&self) -> bool {
        self.preferences.save_as_copy
    }
}
