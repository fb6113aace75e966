//! Tracing setup for applications embedding the client.

use tracing_subscriber::EnvFilter;

use crate::CourtsideError;

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_DIRECTIVE: &str = "info,courtside=debug";

/// Installs a `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// `default_directive` (or [`DEFAULT_DIRECTIVE`]).
///
/// # Errors
/// [`CourtsideError::Telemetry`] if a global subscriber is already set.
pub fn init_tracing(default_directive: Option<&str>) -> Result<(), CourtsideError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive.unwrap_or(DEFAULT_DIRECTIVE)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .compact()
        .try_init()
        .map_err(|e| CourtsideError::Telemetry(e.to_string()))?;

    tracing::debug!("tracing initialized");
    Ok(())
}
