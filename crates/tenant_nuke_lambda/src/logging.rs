use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_DIRECTIVE: &str = "info";

/// `RUST_LOG` wins when it parses; anything else falls back to `info`.
pub fn env_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Installs JSON logging on stderr, which Lambda forwards to CloudWatch.
/// Call once, from the binary.
pub fn init_logging() {
    let rust_log = std::env::var("RUST_LOG").ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(false)
                .with_span_list(false),
        )
        .with(env_filter(rust_log.as_deref()))
        .init();
}
