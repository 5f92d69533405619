//! Diagnostic logging setup.
//!
//! Progress of a wander session goes to the [`SessionLog`](crate::session::SessionLog);
//! this is the stderr `tracing` output controlled by `RUST_LOG`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber. `verbose` lowers the default level to
/// debug when `RUST_LOG` is unset.
pub fn init(verbose: bool) -> anyhow::Result<()> {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init()?;

    Ok(())
}
