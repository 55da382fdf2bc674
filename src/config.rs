// Front-end configuration, read from YAML

use crate::insights::PREVIEW_LIMIT;
use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_DIR: &str = "taskpad";
const CONFIG_FILE: &str = "taskpad.yml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where task data lives; platform data dir when unset
    pub data_dir: Option<PathBuf>,
    /// How many suggestions the preview shows
    pub preview_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            preview_limit: PREVIEW_LIMIT,
        }
    }
}

impl Config {
    /// Default config location, e.g. `~/.config/taskpad/taskpad.yml` on Linux
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load from `path`, or the default location when `None`
    ///
    /// An explicit path must exist. A missing file at the default location
    /// yields the defaults. A malformed file is an error either way.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) => Self::load_or_default(&path),
                None => Ok(Self::default()),
            },
        }
    }

    /// Load `path`, or the defaults when it does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = ?path, "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::from_file(path)
    }

    /// Load `path`, failing if it is missing or malformed
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(eyre!("Config file not found: {:?}", path));
        }

        let content = fs::read_to_string(path).with_context(|| format!("Failed to read config {:?}", path))?;
        let config: Config =
            serde_yaml::from_str(&content).with_context(|| format!("Failed to parse config {:?}", path))?;
        debug!(path = ?path, ?config, "Loaded config");
        Ok(config)
    }

    /// Resolved data directory
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|dir| dir.join(APP_DIR)))
            .unwrap_or_else(|| PathBuf::from(".taskpad"))
    }
}
