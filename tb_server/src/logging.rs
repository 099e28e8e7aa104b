//! Structured logging configuration.
//!
//! The library crate logs through the `log` facade; `tracing-subscriber`'s
//! log bridge forwards those records into the same output.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info,sqlx=warn,hyper=warn";

/// Initialize structured logging
///
/// Log levels are configurable via the `RUST_LOG` env var.
///
/// # Example
///
/// ```no_run
/// use tb_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log security event with structured data
///
/// # Arguments
///
/// * `event_type` - Type of security event
/// * `username` - Discord username, when known
/// * `message` - Event message
///
/// # Example
///
/// ```
/// use tb_server::logging::log_security_event;
///
/// log_security_event("admin_required", Some("player2"), "Refuse attempted without admin role");
/// ```
pub fn log_security_event(event_type: &str, username: Option<&str>, message: &str) {
    tracing::warn!(
        event_type = event_type,
        username = username,
        "SECURITY: {}",
        message
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_security_event() {
        // Just ensure it doesn't panic without a subscriber
        log_security_event("invalid_token", None, "Test message");
        log_security_event("admin_required", Some("user1"), "Test message");
    }

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }
}
