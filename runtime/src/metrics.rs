//! Prometheus metrics for query and request orchestration.
//!
//! Counters are recorded through the `metrics` facade whether or not an
//! exporter is installed; [`MetricsServer::start`] installs the Prometheus
//! recorder and registers descriptions.
//!
//! # Example
//!
//! ```rust,no_run
//! use formulaic_runtime::metrics::MetricsServer;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = MetricsServer::new("0.0.0.0:9090".parse()?);
//! server.start()?;
//!
//! let scrape = server.render();
//! # Ok(())
//! # }
//! ```

use formulaic_core::Outcome;
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use thiserror::Error;

/// Query triggers, valid or not.
pub const QUERY_TRIGGERS: &str = "query_triggers_total";
/// Query calls actually made.
pub const QUERY_EXECUTIONS: &str = "query_executions_total";
/// Query contexts discarded because a newer one was triggered.
pub const QUERY_STALE_DISCARDS: &str = "query_stale_discards_total";
/// Query triggers rejected by validation.
pub const QUERY_VALIDATION_REJECTIONS: &str = "query_validation_rejections_total";
/// Query executions where the action skipped the call.
pub const QUERY_SKIPPED: &str = "query_skipped_total";
/// Query responses ignored because a newer one was recorded.
pub const QUERY_RESPONSES_IGNORED: &str = "query_responses_ignored_total";
/// Request fetches, labelled by outcome kind.
pub const REQUEST_FETCHES: &str = "request_fetches_total";
/// Latency of query calls.
pub const FETCH_DURATION: &str = "query_fetch_duration_seconds";

/// Label value for the kind of `outcome`.
///
/// Kinds received from a peer are collapsed into `"Foreign"` so label
/// cardinality stays bounded.
#[must_use]
pub fn kind_label<T>(outcome: &Outcome<T>) -> String {
    match outcome {
        Outcome::Foreign(_) => "Foreign".to_string(),
        modeled => modeled.kind().to_string(),
    }
}

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Prometheus exporter for orchestration metrics.
pub struct MetricsServer {
    addr: SocketAddr,
    handle: Option<PrometheusHandle>,
}

impl MetricsServer {
    /// Create an exporter that will be scraped at `addr`.
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr, handle: None }
    }

    /// Install the Prometheus recorder.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError`] if the exporter cannot be built or
    /// installed. An already installed recorder is not an error.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::info!(addr = %self.addr, "Metrics recorder installed");
                Ok(())
            }
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            }
        }
    }

    /// Address the exporter is meant to be scraped at.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Render current metrics in Prometheus format, if started.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

fn register_metrics() {
    describe_counter!(QUERY_TRIGGERS, "Total number of query triggers");
    describe_counter!(QUERY_EXECUTIONS, "Total number of query calls made");
    describe_counter!(
        QUERY_STALE_DISCARDS,
        "Query requests discarded because a newer request was triggered"
    );
    describe_counter!(
        QUERY_VALIDATION_REJECTIONS,
        "Query requests rejected by argument validation"
    );
    describe_counter!(QUERY_SKIPPED, "Query executions skipped by the action");
    describe_counter!(
        QUERY_RESPONSES_IGNORED,
        "Query responses ignored because a newer response was recorded"
    );
    describe_counter!(REQUEST_FETCHES, "Request fetches by outcome kind");
    describe_histogram!(FETCH_DURATION, "Time taken by query calls");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn received_kinds_share_one_label() {
        let foreign: Outcome<u32> = Outcome::from_wire(json!({
            "kind": "TenantSuspended-7f3a",
            "status": 423,
            "hasData": false,
            "hasError": true,
            "noValue": false
        }))
        .unwrap();

        assert_eq!(kind_label(&foreign), "Foreign");
        assert_eq!(kind_label(&Outcome::<u32>::missing_permission()), "MissingPermission");
        assert_eq!(kind_label(&Outcome::literal(1)), "Literal");
    }
}
