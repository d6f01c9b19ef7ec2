use std::io;

use clap::Parser;
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use taskify_core::TaskStore;
use taskify_core::theme::{MemoryPreferences, PreferenceStore};

use crate::cli::Cli;
use crate::display::{SharedPalette, supports_color};
use crate::error::Result;
use crate::preferences::{ConfyPreferences, EnvColorScheme};
use crate::session::Session;

mod cli;
mod config;
mod display;
mod error;
mod preferences;
mod session;

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();

    let cfg = config::load().unwrap_or_else(|e| {
        warn!(error = %e, "config unavailable, using defaults");
        config::Config::default()
    });

    let preferences: Box<dyn PreferenceStore> = match ConfyPreferences::new() {
        Ok(prefs) => {
            debug!(path = %prefs.path().display(), "theme preference file");
            Box::new(prefs)
        }
        Err(e) => {
            warn!(error = %e, "theme preference file unavailable, theme will not be remembered");
            Box::new(MemoryPreferences::new())
        }
    };

    let palette = SharedPalette::default();
    let store = TaskStore::builder()
        .preferences(preferences)
        .color_scheme(EnvColorScheme::from_env())
        .surface(palette.clone())
        .seed_examples(cfg.seed_examples && !cli.no_examples)
        .build();

    let use_color = cfg.color && !cli.no_color && supports_color();
    let mode = cli.display.unwrap_or(cfg.display_mode);
    colored::control::set_override(use_color);

    let mut session = Session::new(store, palette, use_color, mode);
    let stdin = io::stdin();
    session.run(stdin.lock(), &mut io::stdout().lock())
}

/// Log to stderr so the session output stays clean; RUST_LOG overrides
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(io::stderr);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
