//! Tracing setup. Logs go to stderr so they never mix with command output.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Default filter directive for the given verbosity (`-v` count).
fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "rater=warn",
        1 => "rater=info",
        2 => "rater=debug",
        _ => "rater=trace",
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `verbosity`.
pub fn init(verbosity: u8) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(verbosity)))
        .context("failed to build log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install logger: {e}"))
}
