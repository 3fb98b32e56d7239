//! Logging setup and span helpers
//!
//! The subscriber is configured once from [`LoggingConfig`]. `RUST_LOG`
//! takes precedence over the configured level so operators can raise
//! verbosity without touching the config file.

use std::time::Instant;
use tracing::Span;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::config::{LogFormat, LoggingConfig};
use crate::context::TaskContext;
use crate::error::{EnoError, EnoResult};

/// Initialize tracing from configuration
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> EnoResult<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| EnoError::configuration("logging.level", e.to_string()))?;

    let registry = Registry::default().with(env_filter);
    let result = match config.format {
        LogFormat::Text => registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .try_init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false),
            )
            .try_init(),
    };

    result.map_err(|e| EnoError::internal(format!("failed to install tracing subscriber: {}", e)))
}

/// Create the span a single task runs in
///
/// `result` and `duration_ms` are recorded by the dispatcher once the task
/// finishes.
#[inline]
pub fn task_span(ctx: &TaskContext) -> Span {
    tracing::info_span!(
        "task",
        task_id = ctx.task_id,
        method = %ctx.method,
        team_id = ctx.team_id,
        task_chain_id = %ctx.task_chain_id,
        current_round_id = ctx.current_round_id,
        related_round_id = ctx.related_round_id,
        variant_id = ctx.variant_id,
        result = tracing::field::Empty,
        duration_ms = tracing::field::Empty,
    )
}

/// Record the duration of an operation in `span`
pub fn record_duration(span: &Span, start: Instant) {
    span.record("duration_ms", start.elapsed().as_millis() as u64);
}
