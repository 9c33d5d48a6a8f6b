//! Invocation metrics.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

/// Label used for function names the dispatcher did not recognize.
const UNKNOWN_FUNCTION: &str = "unknown";

/// Chaincode invocation metrics.
pub struct Metrics {
    /// Total invocations dispatched.
    pub invocations_total: AtomicU64,
    /// Invocations that returned success.
    pub invocations_success: AtomicU64,
    /// Invocations that returned an error.
    pub invocations_failed: AtomicU64,
    /// Invocations per function name.
    by_function: DashMap<&'static str, u64>,
    /// Failures per error code.
    by_error_code: DashMap<&'static str, u64>,
}

impl Metrics {
    /// Create new metrics instance.
    pub fn new() -> Self {
        Self {
            invocations_total: AtomicU64::new(0),
            invocations_success: AtomicU64::new(0),
            invocations_failed: AtomicU64::new(0),
            by_function: DashMap::new(),
            by_error_code: DashMap::new(),
        }
    }

    /// Record a successful invocation of `function`.
    pub fn record_success(&self, function: Option<&'static str>) {
        self.invocations_total.fetch_add(1, Ordering::Relaxed);
        self.invocations_success.fetch_add(1, Ordering::Relaxed);
        *self
            .by_function
            .entry(function.unwrap_or(UNKNOWN_FUNCTION))
            .or_insert(0) += 1;
    }

    /// Record a failed invocation of `function` with `error_code`.
    pub fn record_failure(&self, function: Option<&'static str>, error_code: &'static str) {
        self.invocations_total.fetch_add(1, Ordering::Relaxed);
        self.invocations_failed.fetch_add(1, Ordering::Relaxed);
        *self
            .by_function
            .entry(function.unwrap_or(UNKNOWN_FUNCTION))
            .or_insert(0) += 1;
        *self.by_error_code.entry(error_code).or_insert(0) += 1;
    }

    /// Invocations recorded for a function name.
    pub fn function_count(&self, function: &str) -> u64 {
        self.by_function.get(function).map(|c| *c).unwrap_or(0)
    }

    /// Get current metrics snapshot.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut by_function: Vec<_> = self
            .by_function
            .iter()
            .map(|e| (*e.key(), *e.value()))
            .collect();
        by_function.sort_unstable();

        let mut by_error_code: Vec<_> = self
            .by_error_code
            .iter()
            .map(|e| (*e.key(), *e.value()))
            .collect();
        by_error_code.sort_unstable();

        MetricsSnapshot {
            invocations_total: self.invocations_total.load(Ordering::Relaxed),
            invocations_success: self.invocations_success.load(Ordering::Relaxed),
            invocations_failed: self.invocations_failed.load(Ordering::Relaxed),
            by_function,
            by_error_code,
        }
    }

    /// Export metrics in Prometheus format.
    pub fn to_prometheus(&self) -> String {
        let snapshot = self.snapshot();
        let mut out = format!(
            r#"# HELP chaincode_invocations_total Total number of invocations
# TYPE chaincode_invocations_total counter
chaincode_invocations_total {}

# HELP chaincode_invocations_success Total successful invocations
# TYPE chaincode_invocations_success counter
chaincode_invocations_success {}

# HELP chaincode_invocations_failed Total failed invocations
# TYPE chaincode_invocations_failed counter
chaincode_invocations_failed {}

# HELP chaincode_function_invocations Invocations per function
# TYPE chaincode_function_invocations counter
"#,
            snapshot.invocations_total, snapshot.invocations_success, snapshot.invocations_failed,
        );

        for (function, count) in &snapshot.by_function {
            out.push_str(&format!(
                "chaincode_function_invocations{{function=\"{function}\"}} {count}\n"
            ));
        }

        out.push_str(
            "\n# HELP chaincode_errors Failed invocations per error code\n# TYPE chaincode_errors counter\n",
        );
        for (code, count) in &snapshot.by_error_code {
            out.push_str(&format!("chaincode_errors{{code=\"{code}\"}} {count}\n"));
        }

        out
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub invocations_total: u64,
    pub invocations_success: u64,
    pub invocations_failed: u64,
    pub by_function: Vec<(&'static str, u64)>,
    pub by_error_code: Vec<(&'static str, u64)>,
}

/// Shared metrics instance.
pub type SharedMetrics = Arc<Metrics>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_increment() {
        let metrics = Metrics::new();

        metrics.record_success(Some("createaccount"));
        metrics.record_success(Some("createaccount"));
        metrics.record_failure(Some("transfer"), "ACCOUNT_NOT_FOUND");
        metrics.record_failure(None, "UNKNOWN_FUNCTION");

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.invocations_total, 4);
        assert_eq!(snapshot.invocations_success, 2);
        assert_eq!(snapshot.invocations_failed, 2);
        assert_eq!(metrics.function_count("createaccount"), 2);
        assert_eq!(metrics.function_count("unknown"), 1);
        assert_eq!(metrics.function_count("query"), 0);
    }

    #[test]
    fn test_prometheus_export() {
        let metrics = Metrics::new();
        metrics.record_failure(Some("getaccount"), "ACCOUNT_NOT_FOUND");

        let output = metrics.to_prometheus();
        assert!(output.contains("chaincode_invocations_total 1"));
        assert!(output.contains("chaincode_function_invocations{function=\"getaccount\"} 1"));
        assert!(output.contains("chaincode_errors{code=\"ACCOUNT_NOT_FOUND\"} 1"));
    }
}
