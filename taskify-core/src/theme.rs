//! Theme preference and the collaborators that apply and persist it
//!
//! The core never talks to a terminal, a settings file or the OS directly.
//! It drives three traits instead:
//! - [`ThemeSurface`] receives the concrete light/dark value to render with
//! - [`ColorSchemeProbe`] answers "does the environment prefer dark?"
//! - [`PreferenceStore`] remembers the chosen [`Theme`] across sessions

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Key the theme preference is stored under
pub const THEME_PREFERENCE_KEY: &str = "taskify-theme";

/// User-selected theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    /// Follow the environment's dark-mode preference
    Auto,
}

impl Theme {
    /// Turn the preference into the value a surface can render
    pub fn resolve(self, prefers_dark: bool) -> ResolvedTheme {
        match self {
            Theme::Light => ResolvedTheme::Light,
            Theme::Dark => ResolvedTheme::Dark,
            Theme::Auto if prefers_dark => ResolvedTheme::Dark,
            Theme::Auto => ResolvedTheme::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::Auto => "auto",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "auto" => Ok(Theme::Auto),
            other => Err(CoreError::parse(format!(
                "Unknown theme '{}'. Expected one of: light, dark, auto",
                other
            ))),
        }
    }
}

/// Concrete theme handed to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolvedTheme {
    #[default]
    Light,
    Dark,
}

impl fmt::Display for ResolvedTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedTheme::Light => f.write_str("light"),
            ResolvedTheme::Dark => f.write_str("dark"),
        }
    }
}

/// Presentation-side sink that actually switches colors
pub trait ThemeSurface {
    fn apply(&mut self, theme: ResolvedTheme);
}

/// Environment dark-mode signal, consulted only for [`Theme::Auto`]
pub trait ColorSchemeProbe {
    fn prefers_dark(&self) -> bool;
}

/// Durable key-value home for the theme preference
pub trait PreferenceStore {
    /// Read the stored theme, `Ok(None)` if nothing was saved yet
    fn load_theme(&self) -> Result<Option<Theme>>;

    /// Store the theme under [`THEME_PREFERENCE_KEY`]
    fn save_theme(&mut self, theme: Theme) -> Result<()>;
}

impl<P: PreferenceStore + ?Sized> PreferenceStore for Box<P> {
    fn load_theme(&self) -> Result<Option<Theme>> {
        (**self).load_theme()
    }

    fn save_theme(&mut self, theme: Theme) -> Result<()> {
        (**self).save_theme(theme)
    }
}

/// Resolve `theme` and hand it to `surface` exactly once
pub fn apply_theme(
    theme: Theme,
    probe: &dyn ColorSchemeProbe,
    surface: &mut dyn ThemeSurface,
) -> ResolvedTheme {
    let resolved = match theme {
        Theme::Auto => theme.resolve(probe.prefers_dark()),
        _ => theme.resolve(false),
    };
    surface.apply(resolved);
    resolved
}

/// Probe with a fixed answer
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedColorScheme {
    pub prefers_dark: bool,
}

impl FixedColorScheme {
    pub fn dark() -> Self {
        Self { prefers_dark: true }
    }

    pub fn light() -> Self {
        Self {
            prefers_dark: false,
        }
    }
}

impl ColorSchemeProbe for FixedColorScheme {
    fn prefers_dark(&self) -> bool {
        self.prefers_dark
    }
}

/// Preference store that lives only as long as the process
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferences {
    theme: Option<Theme>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a previously saved theme
    pub fn with_theme(theme: Theme) -> Self {
        Self { theme: Some(theme) }
    }

    pub fn saved(&self) -> Option<Theme> {
        self.theme
    }
}

impl PreferenceStore for MemoryPreferences {
    fn load_theme(&self) -> Result<Option<Theme>> {
        Ok(self.theme)
    }

    fn save_theme(&mut self, theme: Theme) -> Result<()> {
        self.theme = Some(theme);
        Ok(())
    }
}

/// Surface that renders nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSurface;

impl ThemeSurface for NoopSurface {
    fn apply(&mut self, _theme: ResolvedTheme) {}
}
