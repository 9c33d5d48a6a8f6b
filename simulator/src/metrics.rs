//! Simulation metrics.

use std::collections::VecDeque;

/// Simulation metrics.
#[derive(Debug, Clone)]
pub struct SimulationMetrics {
    /// Transactions submitted.
    pub total_invocations: u64,
    /// Transactions that succeeded and were committed.
    pub committed: u64,
    /// Transactions the chaincode rejected.
    pub rejected: u64,
    /// Assertions checked.
    pub assertions: u64,
    /// Latency samples (µs).
    latency_samples: VecDeque<u64>,
    /// Maximum samples to keep.
    max_samples: usize,
}

impl SimulationMetrics {
    /// Create new metrics.
    pub fn new() -> Self {
        Self {
            total_invocations: 0,
            committed: 0,
            rejected: 0,
            assertions: 0,
            latency_samples: VecDeque::with_capacity(10000),
            max_samples: 10000,
        }
    }

    /// Record a committed transaction.
    pub fn record_commit(&mut self, latency_us: u64) {
        self.total_invocations += 1;
        self.committed += 1;
        self.push_sample(latency_us);
    }

    /// Record a rejected transaction.
    pub fn record_rejection(&mut self, latency_us: u64) {
        self.total_invocations += 1;
        self.rejected += 1;
        self.push_sample(latency_us);
    }

    /// Record a passed assertion.
    pub fn record_assertion(&mut self) {
        self.assertions += 1;
    }

    fn push_sample(&mut self, latency_us: u64) {
        if self.latency_samples.len() >= self.max_samples {
            self.latency_samples.pop_front();
        }
        self.latency_samples.push_back(latency_us);
    }

    /// Get average latency in µs.
    pub fn average_latency_us(&self) -> u64 {
        if self.latency_samples.is_empty() {
            return 0;
        }

        let sum: u64 = self.latency_samples.iter().sum();
        sum / self.latency_samples.len() as u64
    }

    /// Get p50 latency.
    pub fn p50_latency_us(&self) -> u64 {
        self.percentile_latency(50)
    }

    /// Get p99 latency.
    pub fn p99_latency_us(&self) -> u64 {
        self.percentile_latency(99)
    }

    fn percentile_latency(&self, percentile: usize) -> u64 {
        if self.latency_samples.is_empty() {
            return 0;
        }

        let mut sorted: Vec<_> = self.latency_samples.iter().copied().collect();
        sorted.sort_unstable();

        let idx = (sorted.len() * percentile / 100).min(sorted.len() - 1);
        sorted[idx]
    }

    /// Fraction of submitted transactions that committed.
    pub fn commit_rate(&self) -> f64 {
        if self.total_invocations == 0 {
            return 0.0;
        }

        self.committed as f64 / self.total_invocations as f64
    }
}

impl Default for SimulationMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics() {
        let mut metrics = SimulationMetrics::new();

        metrics.record_commit(100);
        metrics.record_commit(200);
        metrics.record_commit(150);
        metrics.record_rejection(50);
        metrics.record_assertion();

        assert_eq!(metrics.total_invocations, 4);
        assert_eq!(metrics.committed, 3);
        assert_eq!(metrics.rejected, 1);
        assert_eq!(metrics.assertions, 1);
        assert_eq!(metrics.average_latency_us(), 125);
        assert_eq!(metrics.p50_latency_us(), 150);
        assert_eq!(metrics.p99_latency_us(), 200);
        assert_eq!(metrics.commit_rate(), 0.75);
    }

    #[test]
    fn test_sample_window() {
        let mut metrics = SimulationMetrics::new();
        for i in 0..10_005 {
            metrics.record_commit(i);
        }
        assert_eq!(metrics.latency_samples.len(), 10_000);
        assert_eq!(metrics.latency_samples.front(), Some(&5));
    }
}
