//! Logging integration.
//!
//! Configures the global [`tracing`] subscriber from
//! [`Settings`](crate::settings::Settings) and creates per-request spans.

use crate::settings::Settings;

/// Sets up the global tracing subscriber based on the given settings.
///
/// The filter is read from `settings.log_level`; `RUST_LOG` wins when set.
/// In debug mode a pretty, human-readable format is used; otherwise logs
/// are emitted as JSON lines. Installing twice is a no-op.
pub fn setup_logging(settings: &Settings) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if settings.debug {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(true)
            .with_line_number(true)
            .pretty()
            .try_init()
            .ok();
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init()
            .ok();
    }
}

/// Creates a tracing span for an HTTP request.
///
/// # Examples
///
/// ```
/// use exchange_core::logging::request_span;
///
/// let span = request_span("abc-123", "GET", "/token/bitcoin/");
/// let _guard = span.enter();
/// tracing::info!("handling request");
/// ```
pub fn request_span(request_id: &str, method: &str, path: &str) -> tracing::Span {
    tracing::info_span!("request", id = request_id, method = method, path = path)
}
