//! User configuration loaded through confy
//!
//! Lives next to the theme preference file in the platform config directory.
//! Missing keys fall back to the defaults below.

use serde::{Deserialize, Serialize};

use crate::display::DisplayMode;

/// Application name used for every confy file
pub const APP_NAME: &str = "taskify";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Start each session with the example tasks
    pub seed_examples: bool,
    /// Allow colored output when stdout is a terminal
    pub color: bool,
    /// Default list layout
    pub display_mode: DisplayMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed_examples: true,
            color: true,
            display_mode: DisplayMode::Default,
        }
    }
}

/// Load the config file, creating it with defaults on first run
pub fn load() -> crate::error::Result<Config> {
    Ok(confy::load(APP_NAME, None)?)
}
