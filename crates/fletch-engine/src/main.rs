//! # Fletch Engine
//!
//! Headless runner for Fletch rooms.
//!
//! Loads `fletch.toml` (or the file named by `FLETCH_CONFIG`), builds the
//! configured room and plays the scripted input track through it.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod app;
mod config;
mod timing;

use std::path::PathBuf;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{EngineConfig, CONFIG_FILE};

/// Main entry point.
fn main() -> Result<()> {
    let config_path = std::env::var_os("FLETCH_CONFIG")
        .map_or_else(|| PathBuf::from(CONFIG_FILE), PathBuf::from);
    let mut config = EngineConfig::load_from(&config_path);
    config.validate();

    let mut filter = EnvFilter::from_default_env();
    for directive in config.log_filter.split(',').filter(|d| !d.trim().is_empty()) {
        filter = filter.add_directive(directive.trim().parse()?);
    }
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    info!("Fletch starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!(config = %config_path.display(), room = %config.room.display(), "Configuration");

    app::run(config)?;

    info!("Fletch shutdown complete");
    Ok(())
}
