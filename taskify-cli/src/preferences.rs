//! Environment-backed theme collaborators
//!
//! - [`ConfyPreferences`] keeps the theme in its own confy file named after
//!   the fixed preference key
//! - [`EnvColorScheme`] answers the dark-mode question from the terminal
//!   environment

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use taskify_core::theme::{ColorSchemeProbe, PreferenceStore};
use taskify_core::{CoreError, THEME_PREFERENCE_KEY, Theme};

use crate::config::APP_NAME;

/// Explicit dark-mode override: 1/true/dark or 0/false/light
pub const DARK_MODE_ENV: &str = "TASKIFY_DARK_MODE";

/// `fg;bg` color indices exported by many terminals
pub const COLORFGBG_ENV: &str = "COLORFGBG";

#[derive(Debug, Default, Serialize, Deserialize)]
struct ThemeFile {
    theme: Option<Theme>,
}

/// Theme preference stored through confy
#[derive(Debug, Clone)]
pub struct ConfyPreferences {
    path: PathBuf,
}

impl ConfyPreferences {
    /// Use the platform config directory
    pub fn new() -> crate::error::Result<Self> {
        let path = confy::get_configuration_file_path(APP_NAME, Some(THEME_PREFERENCE_KEY))?;
        Ok(Self { path })
    }

    #[cfg(test)]
    /// Use an explicit file
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for ConfyPreferences {
    fn load_theme(&self) -> taskify_core::Result<Option<Theme>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let file: ThemeFile = confy::load_path(&self.path)
            .map_err(|e| CoreError::preference_with_source("Failed to read theme preference", e))?;
        debug!(path = %self.path.display(), theme = ?file.theme, "theme preference loaded");
        Ok(file.theme)
    }

    fn save_theme(&mut self, theme: Theme) -> taskify_core::Result<()> {
        confy::store_path(&self.path, ThemeFile { theme: Some(theme) })
            .map_err(|e| CoreError::preference_with_source("Failed to save theme preference", e))?;
        debug!(path = %self.path.display(), %theme, "theme preference saved");
        Ok(())
    }
}

/// Dark-mode signal read from environment variables
#[derive(Debug, Clone, Default)]
pub struct EnvColorScheme {
    dark_mode: Option<String>,
    colorfgbg: Option<String>,
}

impl EnvColorScheme {
    /// Snapshot the relevant variables of the current process
    pub fn from_env() -> Self {
        Self {
            dark_mode: std::env::var(DARK_MODE_ENV).ok(),
            colorfgbg: std::env::var(COLORFGBG_ENV).ok(),
        }
    }

    #[cfg(test)]
    pub fn from_values(dark_mode: Option<&str>, colorfgbg: Option<&str>) -> Self {
        Self {
            dark_mode: dark_mode.map(str::to_string),
            colorfgbg: colorfgbg.map(str::to_string),
        }
    }
}

impl ColorSchemeProbe for EnvColorScheme {
    fn prefers_dark(&self) -> bool {
        if let Some(flag) = self.dark_mode.as_deref().and_then(parse_flag) {
            return flag;
        }

        // last field is the background index; 0-6 and 8 are the dark colors
        self.colorfgbg
            .as_deref()
            .and_then(|value| value.rsplit(';').next())
            .and_then(|bg| bg.trim().parse::<u8>().ok())
            .is_some_and(|bg| bg <= 6 || bg == 8)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "dark" => Some(true),
        "0" | "false" | "no" | "light" => Some(false),
        _ => None,
    }
}
