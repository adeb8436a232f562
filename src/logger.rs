use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Install the global subscriber. `TIERSTRESS_LOG` wins over `RUST_LOG`;
/// without either, `debug` enables per-request lines.
pub fn init_logging(debug: bool) {
    let filter = std::env::var("TIERSTRESS_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .map_or_else(
            |_| EnvFilter::new(default_directive(debug)),
            |value| EnvFilter::try_new(value).unwrap_or_else(|_| EnvFilter::new("info")),
        );

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();

    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set global default subscriber: {}", err);
    }
}

const fn default_directive(debug: bool) -> &'static str {
    if debug { "debug" } else { "info" }
}
