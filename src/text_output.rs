//! Human-readable summary output (default format)

use crate::classifier::MappedRecord;
use crate::replay::ReplayReport;
use crate::stats::LatencyStats;
use std::fmt::{self, Write};

/// Metrics table for a replay report, rendered through `Display`
pub struct SummaryTable<'a>(pub &'a ReplayReport);

impl fmt::Display for SummaryTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_summary(f, self.0)
    }
}

/// Render the metrics table for a replay report
pub fn format_summary(report: &ReplayReport) -> String {
    SummaryTable(report).to_string()
}

fn write_summary<W: Write>(out: &mut W, report: &ReplayReport) -> fmt::Result {
    let summary = &report.summary;

    writeln!(out, "--- ISOCORE PERFORMANCE METRICS ---")?;
    writeln!(out, "Total Traces Processed:  {}", summary.total_processed)?;
    writeln!(out, "Filtered As Noise:       {}", summary.filtered_count)?;
    writeln!(out, "Collapsed Bulk Ops:      {}", summary.collapsed_count)?;
    writeln!(
        out,
        "Final Graph Nodes:       {}",
        summary.mapped_count + summary.collapsed_count
    )?;
    if report.skipped > 0 {
        writeln!(out, "Skipped (malformed):     {}", report.skipped)?;
    }
    writeln!(
        out,
        "Noise Reduction Ratio:   {:.2}%",
        summary.noise_reduction_ratio * 100.0
    )?;
    writeln!(
        out,
        "Average Mapping Latency: {:.4} ms",
        summary.mean_latency_us() / 1_000.0
    )?;
    writeln!(
        out,
        "Throughput:              {:.0} events/sec",
        report.throughput()
    )?;
    writeln!(out, "-----------------------------------")?;

    if let Some(latency) = &report.latency {
        write_extended(out, latency)?;
    }

    if !report.records.is_empty() {
        writeln!(out)?;
        writeln!(out, "Mapped records (first {}):", report.records.len())?;
        for record in &report.records {
            writeln!(out, "  {}", describe(record))?;
        }
    }

    Ok(())
}

fn write_extended<W: Write>(out: &mut W, latency: &LatencyStats) -> fmt::Result {
    writeln!(out)?;
    writeln!(
        out,
        "=== Extended Latency Statistics ({} samples) ===",
        latency.samples
    )?;
    writeln!(out, "  Mean:         {:.3} μs", latency.mean)?;
    writeln!(out, "  Std Dev:      {:.3} μs", latency.stddev)?;
    writeln!(out, "  Min:          {:.3} μs", latency.min)?;
    writeln!(out, "  Max:          {:.3} μs", latency.max)?;
    writeln!(out, "  Median (P50): {:.3} μs", latency.median)?;
    writeln!(out, "  P90:          {:.3} μs", latency.p90)?;
    writeln!(out, "  P95:          {:.3} μs", latency.p95)?;
    writeln!(out, "  P99:          {:.3} μs", latency.p99)
}

fn describe(record: &MappedRecord) -> String {
    let line = match record {
        MappedRecord::AbstractedBulk { pid, layer, .. } => {
            format!("[{}] Process({}) abstracted bulk operation", layer, pid)
        }
        MappedRecord::Direct {
            pid,
            label,
            layer,
            edge: Some(edge),
            ..
        } => format!("[{}] {} :: {} (pid {})", layer, label, edge, pid),
        MappedRecord::Direct {
            pid, label, layer, ..
        } => format!("[{}] {} (pid {})", layer, label, pid),
    };
    match record.id() {
        Some(id) => format!("{} {}", id, line),
        None => line,
    }
}
