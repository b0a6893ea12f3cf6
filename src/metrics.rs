//! Request metrics and statistics tracking for the detection service.

use crate::types::Label;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector for served requests
pub struct ServiceMetrics {
    /// Successful predictions
    pub predictions: AtomicU64,
    /// Predictions labelled fraudulent
    pub fraudulent: AtomicU64,
    /// Requests rejected for missing input
    pub validation_failures: AtomicU64,
    /// Requests whose inference raised
    pub inference_failures: AtomicU64,
    /// Health checks run
    pub health_checks: AtomicU64,
    /// Health checks that failed
    pub health_failures: AtomicU64,
    /// Prediction latencies (in microseconds)
    latencies: RwLock<Vec<u64>>,
    /// Fraud probability distribution buckets
    score_buckets: RwLock<[u64; 10]>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl ServiceMetrics {
    pub fn new() -> Self {
        Self {
            predictions: AtomicU64::new(0),
            fraudulent: AtomicU64::new(0),
            validation_failures: AtomicU64::new(0),
            inference_failures: AtomicU64::new(0),
            health_checks: AtomicU64::new(0),
            health_failures: AtomicU64::new(0),
            latencies: RwLock::new(Vec::with_capacity(1000)),
            score_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record a successful prediction
    pub fn record_prediction(&self, latency: Duration, label: Label, fraud_probability: f64) {
        self.predictions.fetch_add(1, Ordering::Relaxed);
        if label == Label::Fraudulent {
            self.fraudulent.fetch_add(1, Ordering::Relaxed);
        }

        if let Ok(mut latencies) = self.latencies.write() {
            latencies.push(latency.as_micros() as u64);
            // Keep only last 10000
            if latencies.len() > 10000 {
                latencies.drain(0..5000);
            }
        }

        let bucket = (fraud_probability.clamp(0.0, 1.0) * 10.0).min(9.0) as usize;
        if let Ok(mut buckets) = self.score_buckets.write() {
            buckets[bucket] += 1;
        }
    }

    pub fn record_validation_failure(&self) {
        self.validation_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_inference_failure(&self) {
        self.inference_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_health_check(&self, ok: bool) {
        self.health_checks.fetch_add(1, Ordering::Relaxed);
        if !ok {
            self.health_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Get prediction latency statistics
    pub fn get_latency_stats(&self) -> LatencyStats {
        let Ok(latencies) = self.latencies.read() else {
            return LatencyStats::default();
        };
        if latencies.is_empty() {
            return LatencyStats::default();
        }

        let mut sorted: Vec<u64> = latencies.clone();
        sorted.sort_unstable();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        LatencyStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[(count as f64 * 0.95) as usize],
            p99_us: sorted[(count as f64 * 0.99) as usize],
            max_us: *sorted.last().unwrap_or(&0),
        }
    }

    /// Get current throughput (predictions per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.predictions.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn get_score_distribution(&self) -> [u64; 10] {
        self.score_buckets.read().map(|b| *b).unwrap_or([0; 10])
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let predictions = self.predictions.load(Ordering::Relaxed);
        let fraudulent = self.fraudulent.load(Ordering::Relaxed);
        let fraud_rate = if predictions > 0 {
            (fraudulent as f64 / predictions as f64) * 100.0
        } else {
            0.0
        };

        let latency = self.get_latency_stats();
        let score_dist = self.get_score_distribution();

        info!(
            predictions,
            fraudulent,
            fraud_rate = format!("{:.1}%", fraud_rate),
            throughput = format!("{:.1} req/s", self.get_throughput()),
            validation_failures = self.validation_failures.load(Ordering::Relaxed),
            inference_failures = self.inference_failures.load(Ordering::Relaxed),
            health_checks = self.health_checks.load(Ordering::Relaxed),
            health_failures = self.health_failures.load(Ordering::Relaxed),
            "Service metrics summary"
        );
        info!(
            mean_us = latency.mean_us,
            p50_us = latency.p50_us,
            p95_us = latency.p95_us,
            p99_us = latency.p99_us,
            max_us = latency.max_us,
            "Prediction latency"
        );

        let total: u64 = score_dist.iter().sum();
        if total > 0 {
            for (i, &count) in score_dist.iter().enumerate() {
                let pct = (count as f64 / total as f64) * 100.0;
                let bar: String = "█".repeat(((pct / 5.0) as usize).min(20));
                info!(
                    "Fraud probability {:.1}-{:.1}: {:>6} ({:>5.1}%) {}",
                    i as f64 / 10.0,
                    (i + 1) as f64 / 10.0,
                    count,
                    pct,
                    bar
                );
            }
        }
    }
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Prediction latency statistics
#[derive(Debug, Default)]
pub struct LatencyStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Prints periodic summaries
pub struct MetricsReporter {
    metrics: Arc<ServiceMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<ServiceMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let period = Duration::from_secs(self.interval_secs);
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_recording() {
        let metrics = ServiceMetrics::new();

        metrics.record_prediction(Duration::from_micros(100), Label::NonFraudulent, 0.1);
        metrics.record_prediction(Duration::from_micros(300), Label::Fraudulent, 0.9);
        metrics.record_validation_failure();
        metrics.record_inference_failure();
        metrics.record_health_check(true);
        metrics.record_health_check(false);

        assert_eq!(metrics.predictions.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.fraudulent.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.validation_failures.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.inference_failures.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.health_checks.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.health_failures.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_latency_stats() {
        let metrics = ServiceMetrics::new();
        for us in [100, 200, 300, 400] {
            metrics.record_prediction(Duration::from_micros(us), Label::NonFraudulent, 0.2);
        }

        let stats = metrics.get_latency_stats();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.mean_us, 250);
        assert_eq!(stats.max_us, 400);
    }

    #[test]
    fn test_score_buckets() {
        let metrics = ServiceMetrics::new();
        metrics.record_prediction(Duration::ZERO, Label::Fraudulent, 1.0);
        metrics.record_prediction(Duration::ZERO, Label::NonFraudulent, 0.05);

        let dist = metrics.get_score_distribution();
        assert_eq!(dist[9], 1);
        assert_eq!(dist[0], 1);
    }
}
