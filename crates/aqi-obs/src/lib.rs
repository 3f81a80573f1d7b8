use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Workspace crates whose events are kept at debug by default
const SERVICE_TARGETS: [&str; 3] = ["aqi_core", "aqi_upstream", "aqi_server"];

/// Filter used when RUST_LOG is unset: info everywhere, debug for our crates
pub fn default_filter() -> String {
    std::iter::once("info".to_string())
        .chain(SERVICE_TARGETS.iter().map(|t| format!("{t}=debug")))
        .collect::<Vec<_>>()
        .join(",")
}

/// Install the JSON log subscriber. RUST_LOG wins over [`default_filter`];
/// an unparsable RUST_LOG falls back to it.
pub fn init(service_name: &str, version: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter()));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false),
        )
        .init();

    tracing::info!(service = %service_name, %version, "logging initialized");
}
