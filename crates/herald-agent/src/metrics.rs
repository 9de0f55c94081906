//! Metrics collection and export for the Herald agent.
//!
//! Uses the `metrics` crate for instrumentation and exports
//! to Prometheus format.

use herald_protocol::Platform;
use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::info;

/// Metric names.
pub mod names {
    pub const REGISTRATIONS_TOTAL: &str = "herald_registrations_total";
    pub const NOTIFICATIONS_TOTAL: &str = "herald_notifications_total";
    pub const TOKENS_TOTAL: &str = "herald_tokens_total";
    pub const ERRORS_TOTAL: &str = "herald_errors_total";
}

/// Initialize the metrics system.
pub fn init_metrics() {
    metrics::describe_counter!(
        names::REGISTRATIONS_TOTAL,
        "Push registrations by outcome"
    );
    metrics::describe_counter!(
        names::NOTIFICATIONS_TOTAL,
        "Notifications handed to the dispatcher"
    );
    metrics::describe_counter!(names::TOKENS_TOTAL, "Token announcements by platform");
    metrics::describe_counter!(names::ERRORS_TOTAL, "Total number of errors");

    info!("Metrics initialized");
}

/// Start the Prometheus metrics server.
///
/// # Errors
///
/// Returns an error if the server cannot be started.
pub fn start_metrics_server(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    info!("Metrics server listening on {}", addr);
    Ok(())
}

/// Record a registration outcome ("ok" or "error").
pub fn record_registration(outcome: &'static str) {
    counter!(names::REGISTRATIONS_TOTAL, "outcome" => outcome).increment(1);
}

/// Record a notification handed to the dispatcher.
pub fn record_notification() {
    counter!(names::NOTIFICATIONS_TOTAL).increment(1);
}

/// Record a token announcement.
pub fn record_token(platform: Platform) {
    counter!(names::TOKENS_TOTAL, "platform" => platform.as_str()).increment(1);
}

/// Record an error.
pub fn record_error(error_type: &'static str) {
    counter!(names::ERRORS_TOTAL, "type" => error_type).increment(1);
}
