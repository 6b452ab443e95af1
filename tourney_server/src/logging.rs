//! Structured logging configuration.
//!
//! The tournament library logs through the `log` facade; the subscriber
//! installed here forwards those records alongside the server's own
//! `tracing` events.

use tourney::tournament::{ErrorCode, TournamentError};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Log levels are configurable via the `RUST_LOG` env var
/// (default: `info,sqlx=warn,hyper=warn`).
///
/// # Example
///
/// ```no_run
/// use tourney_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,hyper=warn"));

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

/// Log a failed tournament operation
///
/// Internal failures are logged at error level with the full error;
/// rejected requests (bad input, wrong state, missing permissions) at debug.
pub fn log_operation_error(operation: &str, tournament_id: Option<&str>, err: &TournamentError) {
    let code = err.code();
    match code {
        ErrorCode::Internal => tracing::error!(
            operation = operation,
            tournament_id = tournament_id,
            code = %code,
            "Tournament operation failed: {}",
            err
        ),
        ErrorCode::Aborted => tracing::warn!(
            operation = operation,
            tournament_id = tournament_id,
            code = %code,
            "Tournament operation aborted: {}",
            err
        ),
        _ => tracing::debug!(
            operation = operation,
            tournament_id = tournament_id,
            code = %code,
            "Tournament operation rejected: {}",
            err
        ),
    }
}
