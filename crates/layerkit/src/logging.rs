//! Tracing subscriber initialisation
//!
//! Only the binary installs a subscriber; `layerkit-core` only emits events.
//!
//! | Flag      | Filter level |
//! |-----------|--------------|
//! | (none)    | WARN         |
//! | `--debug` | DEBUG        |
//!
//! `RUST_LOG` overrides both.

use std::io::IsTerminal as _;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber, writing to stderr
pub fn init_logging(debug: bool, no_color: bool) -> anyhow::Result<()> {
    let level = level_for(debug);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("layerkit={level},layerkit_core={level}")));

    let use_ansi = !no_color && std::io::stderr().is_terminal();

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(debug)
        .with_ansi(use_ansi)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialise tracing: {e}"))?;

    Ok(())
}

fn level_for(debug: bool) -> &'static str {
    if debug {
        "debug"
    } else {
        "warn"
    }
}
