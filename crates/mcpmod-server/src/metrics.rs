//! Prometheus request metrics.
//!
//! Two collectors are registered against a caller-supplied registry:
//!
//! - `mcp_server_requests_total{method,target,status}`, a counter
//! - `mcp_server_requests_duration_seconds{method,target}`, a histogram
//!
//! Both are prefixed by the configured namespace and subsystem.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use mcpmod_server::config::MetricsConfig;
//! use mcpmod_server::metrics::{Outcome, RequestMetrics};
//!
//! let registry = prometheus::Registry::new();
//! let metrics = RequestMetrics::new(&registry, &MetricsConfig::default()).unwrap();
//!
//! metrics.observe("tools/call", "create-book", Outcome::Error, Duration::from_millis(3));
//! assert_eq!(metrics.request_count("tools/call", "create-book", Outcome::Error), 1);
//! ```

use std::time::Duration;

use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};

use crate::config::MetricsConfig;

/// Whether a request succeeded; the `status` label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The handler returned a result.
    Success,
    /// The request failed.
    Error,
}

impl Outcome {
    /// Label value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// Request counter and latency histogram.
#[derive(Debug, Clone)]
pub struct RequestMetrics {
    requests: IntCounterVec,
    durations: HistogramVec,
}

impl RequestMetrics {
    /// Create the collectors and register them.
    ///
    /// Fails when collectors with the same names are already registered.
    pub fn new(registry: &Registry, config: &MetricsConfig) -> Result<Self, prometheus::Error> {
        let namespace = sanitize(&config.collect.namespace);
        let subsystem = sanitize(&config.collect.subsystem);

        let requests = IntCounterVec::new(
            Opts::new("mcp_server_requests_total", "Number of processed MCP requests")
                .namespace(namespace.clone())
                .subsystem(subsystem.clone()),
            &["method", "target", "status"],
        )?;

        let durations = HistogramVec::new(
            HistogramOpts::new(
                "mcp_server_requests_duration_seconds",
                "Time spent processing MCP requests",
            )
            .namespace(namespace)
            .subsystem(subsystem)
            .buckets(buckets(&config.buckets)),
            &["method", "target"],
        )?;

        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(durations.clone()))?;

        Ok(Self {
            requests,
            durations,
        })
    }

    /// Count one request and record its latency.
    pub fn observe(&self, method: &str, target: &str, outcome: Outcome, latency: Duration) {
        self.requests
            .with_label_values(&[method, target, outcome.as_str()])
            .inc();
        self.durations
            .with_label_values(&[method, target])
            .observe(latency.as_secs_f64());
    }

    /// Current counter value for a label set.
    #[must_use]
    pub fn request_count(&self, method: &str, target: &str, outcome: Outcome) -> u64 {
        self.requests
            .with_label_values(&[method, target, outcome.as_str()])
            .get()
    }

    /// Number of latency samples recorded for a label set.
    #[must_use]
    pub fn sample_count(&self, method: &str, target: &str) -> u64 {
        self.durations
            .with_label_values(&[method, target])
            .get_sample_count()
    }
}

/// Replace characters Prometheus rejects in metric names with `_`.
#[must_use]
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Configured buckets, or the Prometheus defaults when none are set.
fn buckets(configured: &[f64]) -> Vec<f64> {
    let mut buckets: Vec<f64> = configured.iter().copied().filter(|b| !b.is_nan()).collect();
    if buckets.is_empty() {
        return prometheus::DEFAULT_BUCKETS.to_vec();
    }
    buckets.sort_by(f64::total_cmp);
    buckets.dedup();
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MetricsCollectConfig;

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("my-app.v2"), "my_app_v2");
        assert_eq!(sanitize("ok_name"), "ok_name");
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn test_buckets() {
        assert_eq!(buckets(&[]), prometheus::DEFAULT_BUCKETS.to_vec());
        assert_eq!(buckets(&[1.0, 0.1, 1.0, f64::NAN]), vec![0.1, 1.0]);
    }

    #[test]
    fn test_names_carry_namespace_and_subsystem() {
        let registry = Registry::new();
        let config = MetricsConfig {
            collect: MetricsCollectConfig {
                enabled: true,
                namespace: "books-app".to_string(),
                subsystem: "mcp".to_string(),
            },
            buckets: vec![0.5],
        };
        let metrics = RequestMetrics::new(&registry, &config).unwrap();
        metrics.observe("ping", "", Outcome::Success, Duration::from_millis(1));

        let names: Vec<String> = registry
            .gather()
            .iter()
            .map(|family| family.name().to_string())
            .collect();
        assert!(names.contains(&"books_app_mcp_mcp_server_requests_total".to_string()));
        assert!(
            names.contains(&"books_app_mcp_mcp_server_requests_duration_seconds".to_string())
        );
    }

    #[test]
    fn test_observe_counts_per_outcome() {
        let registry = Registry::new();
        let metrics = RequestMetrics::new(&registry, &MetricsConfig::default()).unwrap();

        metrics.observe("tools/call", "t", Outcome::Success, Duration::from_millis(1));
        metrics.observe("tools/call", "t", Outcome::Error, Duration::from_millis(1));
        metrics.observe("tools/call", "t", Outcome::Error, Duration::from_millis(1));

        assert_eq!(metrics.request_count("tools/call", "t", Outcome::Success), 1);
        assert_eq!(metrics.request_count("tools/call", "t", Outcome::Error), 2);
        assert_eq!(metrics.sample_count("tools/call", "t"), 3);
    }

    #[test]
    fn test_double_registration_fails() {
        let registry = Registry::new();
        RequestMetrics::new(&registry, &MetricsConfig::default()).unwrap();
        assert!(RequestMetrics::new(&registry, &MetricsConfig::default()).is_err());
    }
}
