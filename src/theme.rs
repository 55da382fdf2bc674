// Light/dark preference, stored as a plain string under the `theme` key

use crate::storage::{Storage, THEME_KEY};
use eyre::Result;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Read the stored preference, defaulting to light when absent or unreadable
    pub fn load<S: Storage + ?Sized>(storage: &S) -> Self {
        match storage.get(THEME_KEY) {
            Ok(Some(raw)) => raw.parse().unwrap_or_else(|e| {
                warn!(error = %e, "Ignoring stored theme");
                Theme::default()
            }),
            Ok(None) => Theme::default(),
            Err(e) => {
                warn!(error = ?e, "Failed to read theme");
                Theme::default()
            }
        }
    }

    pub fn save<S: Storage + ?Sized>(self, storage: &mut S) -> Result<()> {
        storage.set(THEME_KEY, self.as_str())?;
        debug!(theme = %self, "Saved theme");
        Ok(())
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("invalid theme: {:?} (expected light or dark)", other)),
        }
    }
}
