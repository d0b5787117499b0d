//! Tracing subscriber setup.

use anyhow::{Result, anyhow};
use tickwell_lib::Verbosity;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber on stderr.
///
/// `RUST_LOG` takes precedence over the filter implied by `verbosity`.
pub(crate) fn init(verbosity: Verbosity, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.default_filter()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow!("failed to install log subscriber: {e}"))
}
