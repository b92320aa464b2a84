//! Fixed-bucket latency histogram.
//!
//! Contract calls on SQLite take from a few hundred nanoseconds to a few
//! milliseconds, so buckets are in nanoseconds. Percentiles report the upper
//! boundary of the bucket containing the target rank.

use std::time::Duration;

use serde::Serialize;

/// Bucket upper bounds in nanoseconds.
const BUCKETS_NS: [u64; 16] = [
    500,           // 500 ns
    1_000,         // 1 us
    2_000,         // 2 us
    5_000,         // 5 us
    10_000,        // 10 us
    20_000,        // 20 us
    50_000,        // 50 us
    100_000,       // 100 us
    200_000,       // 200 us
    500_000,       // 500 us
    1_000_000,     // 1 ms
    5_000_000,     // 5 ms
    10_000_000,    // 10 ms
    50_000_000,    // 50 ms
    100_000_000,   // 100 ms
    1_000_000_000, // 1 s
];

/// Latency histogram for one run.
#[derive(Debug, Clone)]
pub struct LatencyHistogram {
    counts: [u64; BUCKETS_NS.len()],
    /// Observations beyond the last bucket.
    overflow: u64,
    sum_ns: u64,
    count: u64,
    max_ns: u64,
}

/// Summary statistics of a histogram, in nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LatencySummary {
    pub avg_ns: u64,
    pub p50_ns: u64,
    pub p99_ns: u64,
    pub max_ns: u64,
}

impl LatencyHistogram {
    /// Create an empty histogram.
    pub fn new() -> Self {
        Self {
            counts: [0; BUCKETS_NS.len()],
            overflow: 0,
            sum_ns: 0,
            count: 0,
            max_ns: 0,
        }
    }

    /// Record one observation.
    pub fn observe(&mut self, elapsed: Duration) {
        let ns = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.sum_ns = self.sum_ns.saturating_add(ns);
        self.count += 1;
        self.max_ns = self.max_ns.max(ns);

        match BUCKETS_NS.iter().position(|&bound| ns <= bound) {
            Some(i) => self.counts[i] += 1,
            None => self.overflow += 1,
        }
    }

    /// Number of observations.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Sum of all observations.
    pub fn total(&self) -> Duration {
        Duration::from_nanos(self.sum_ns)
    }

    /// Largest observation in nanoseconds.
    pub fn max(&self) -> u64 {
        self.max_ns
    }

    /// Mean observation in nanoseconds.
    pub fn avg(&self) -> u64 {
        if self.count == 0 {
            return 0;
        }
        self.sum_ns / self.count
    }

    /// Approximate percentile (e.g., 0.50 for P50, 0.99 for P99).
    pub fn percentile(&self, p: f64) -> u64 {
        if self.count == 0 {
            return 0;
        }

        let target = ((self.count as f64 * p).ceil() as u64).max(1);
        let mut cumulative = 0u64;
        for (i, count) in self.counts.iter().enumerate() {
            cumulative += count;
            if cumulative >= target {
                return BUCKETS_NS[i];
            }
        }

        // Target rank falls in the overflow bucket
        self.max_ns
    }

    /// Summary for reports.
    pub fn summary(&self) -> LatencySummary {
        LatencySummary {
            avg_ns: self.avg(),
            p50_ns: self.percentile(0.50),
            p99_ns: self.percentile(0.99),
            max_ns: self.max_ns,
        }
    }
}

impl Default for LatencyHistogram {
    fn default() -> Self {
        Self::new()
    }
}
