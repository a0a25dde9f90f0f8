use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt};

use crate::Result;
use crate::error::Error;

const DEFAULT_FILTER: &str = "warn,zbx_manager=info";

/// Install the global subscriber. Events go to stderr so command output on
/// stdout stays machine readable.
///
/// The first filter that parses wins: `explicit_filter`, then `RUST_LOG`,
/// then `warn,zbx_manager=info`.
///
/// # Errors
///
/// Returns an error if JSON output is requested without the `json-logs`
/// feature, or if a global subscriber is already installed.
pub fn init_tracing(explicit_filter: Option<&str>, use_json: bool) -> Result<()> {
    let env = std::env::var("RUST_LOG").ok();
    let filter = explicit_filter
        .into_iter()
        .chain(env.as_deref())
        .chain(std::iter::once(DEFAULT_FILTER))
        .find_map(|candidate| EnvFilter::try_new(candidate).ok())
        .ok_or_else(|| Error::Telemetry("invalid log filter".to_string()))?;

    #[cfg(feature = "json-logs")]
    if use_json {
        let subscriber = Registry::default().with(filter).with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .json()
                .flatten_event(true),
        );
        return tracing::subscriber::set_global_default(subscriber)
            .map_err(|err| Error::Telemetry(err.to_string()));
    }

    #[cfg(not(feature = "json-logs"))]
    if use_json {
        return Err(Error::Telemetry(
            "built without the `json-logs` feature".to_string(),
        ));
    }

    let subscriber = Registry::default().with(filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true),
    );
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|err| Error::Telemetry(err.to_string()))
}
