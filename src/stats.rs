//! Latency statistics over classification samples
//!
//! Mean, spread and extremes go through Trueno's SIMD vector ops;
//! percentiles are linearly interpolated over the sorted samples.

use std::time::Duration;

/// Extended latency statistics, all values in microseconds
#[derive(Debug, Clone, PartialEq)]
pub struct LatencyStats {
    pub samples: usize,
    pub mean: f32,
    pub stddev: f32,
    pub min: f32,
    pub max: f32,
    pub median: f32, // P50
    pub p90: f32,
    pub p95: f32,
    pub p99: f32,
}

impl LatencyStats {
    /// Compute statistics for a latency sample sequence
    ///
    /// Returns `None` when there are no samples.
    pub fn from_samples(samples: &[Duration]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let micros: Vec<f32> = samples
            .iter()
            .map(|d| d.as_nanos() as f32 / 1_000.0)
            .collect();

        let v = trueno::Vector::from_slice(&micros);
        let mean = v.mean().unwrap_or(0.0);
        let stddev = v.stddev().unwrap_or(0.0);
        let min = v.min().unwrap_or(0.0);
        let max = v.max().unwrap_or(0.0);

        let mut sorted = micros;
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        Some(Self {
            samples: sorted.len(),
            mean,
            stddev,
            min,
            max,
            median: percentile(&sorted, 50.0),
            p90: percentile(&sorted, 90.0),
            p95: percentile(&sorted, 95.0),
            p99: percentile(&sorted, 99.0),
        })
    }
}

/// Calculate percentile from sorted data
fn percentile(sorted_data: &[f32], percentile: f32) -> f32 {
    if sorted_data.is_empty() {
        return 0.0;
    }
    if sorted_data.len() == 1 {
        return sorted_data[0];
    }

    let index = (percentile / 100.0) * (sorted_data.len() - 1) as f32;
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;

    if lower == upper {
        sorted_data[lower]
    } else {
        let weight = index - lower as f32;
        sorted_data[lower] * (1.0 - weight) + sorted_data[upper] * weight
    }
}
