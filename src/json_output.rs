//! JSON output format for replay reports

use crate::classifier::MappedRecord;
use crate::replay::ReplayReport;
use crate::stats::LatencyStats;
use serde::{Deserialize, Serialize};

/// Extended latency block (if --stats-extended enabled)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonLatency {
    pub samples: usize,
    pub mean_us: f32,
    pub stddev_us: f32,
    pub min_us: f32,
    pub max_us: f32,
    pub p50_us: f32,
    pub p90_us: f32,
    pub p95_us: f32,
    pub p99_us: f32,
}

impl From<&LatencyStats> for JsonLatency {
    fn from(stats: &LatencyStats) -> Self {
        Self {
            samples: stats.samples,
            mean_us: stats.mean,
            stddev_us: stats.stddev,
            min_us: stats.min,
            max_us: stats.max,
            p50_us: stats.median,
            p90_us: stats.p90,
            p95_us: stats.p95,
            p99_us: stats.p99,
        }
    }
}

/// Summary metrics for the run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSummary {
    pub total_processed: u64,
    pub filtered_count: u64,
    pub collapsed_count: u64,
    pub mapped_count: u64,
    /// Malformed lines skipped before classification
    pub skipped_count: u64,
    /// Fraction of processed events filtered as noise (0.0 to 1.0)
    pub noise_reduction_ratio: f64,
    pub mean_latency_us: f64,
    /// Events per second of wall-clock time
    pub throughput_eps: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency: Option<JsonLatency>,
}

/// Root JSON output structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonOutput {
    /// Format version identifier
    pub version: String,
    /// Format name
    pub format: String,
    /// Mapped records (abstracted bulk and direct), up to the preview limit
    pub records: Vec<MappedRecord>,
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Build the JSON document for a replay report
    pub fn from_report(report: &ReplayReport) -> Self {
        let summary = &report.summary;
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            format: "isocore-json-v1".to_string(),
            records: report.records.clone(),
            summary: JsonSummary {
                total_processed: summary.total_processed,
                filtered_count: summary.filtered_count,
                collapsed_count: summary.collapsed_count,
                mapped_count: summary.mapped_count,
                skipped_count: report.skipped,
                noise_reduction_ratio: summary.noise_reduction_ratio,
                mean_latency_us: summary.mean_latency_us(),
                throughput_eps: report.throughput(),
                latency: report.latency.as_ref().map(JsonLatency::from),
            },
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
