//! Replay a recorded trace log through the classifier
//!
//! Input is JSON lines: one [`RawTraceRecord`] object per line. Blank lines
//! and `#` comments are ignored.

use crate::classifier::{ClassifyError, EventClassifier, MappedRecord, Summary};
use crate::config::EngineConfig;
use crate::event::RawTraceRecord;
use crate::stats::LatencyStats;
use anyhow::{Context, Result};
use std::io::BufRead;
use std::time::{Duration, Instant};

/// Outcome of a replay run
#[derive(Debug, Clone)]
pub struct ReplayReport {
    /// Mapped records, truncated to the configured preview limit
    pub records: Vec<MappedRecord>,
    pub summary: Summary,
    /// Lines rejected as malformed (only with `skip_invalid`)
    pub skipped: u64,
    /// Wall-clock duration of reading and classifying every line
    pub elapsed: Duration,
    /// Extended latency statistics (only with `stats_extended`)
    pub latency: Option<LatencyStats>,
}

impl ReplayReport {
    /// Events processed per second of wall-clock time
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.summary.total_processed as f64 / secs
        } else {
            0.0
        }
    }
}

/// Parse one log line; `Ok(None)` for blank and comment lines
pub fn parse_line(line: &str) -> serde_json::Result<Option<RawTraceRecord>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(line).map(Some)
}

/// Run every record of `reader` through a fresh classifier
///
/// # Errors
///
/// Fails on I/O errors, on the first malformed line unless
/// `config.skip_invalid` is set, and with [`ClassifyError::EmptyInput`] when
/// no event was classified at all.
pub fn replay<R: BufRead>(mut reader: R, config: &EngineConfig) -> Result<ReplayReport> {
    let start = Instant::now();
    let mut classifier = EventClassifier::new();
    let mut records = Vec::new();
    let mut skipped = 0u64;
    let mut buf = Vec::new();
    let mut line_no = 0usize;

    loop {
        buf.clear();
        line_no += 1;
        let read = reader
            .read_until(b'\n', &mut buf)
            .with_context(|| format!("Failed to read line {}", line_no))?;
        if read == 0 {
            break;
        }

        // Invalid UTF-8 is a malformed record, not an I/O failure
        let outcome = match std::str::from_utf8(&buf) {
            Ok(line) => match parse_line(line) {
                Ok(None) => continue,
                Ok(Some(raw)) => classifier.classify_raw(raw).map_err(anyhow::Error::from),
                Err(e) => Err(anyhow::Error::from(e)),
            },
            Err(e) => Err(anyhow::Error::from(e)),
        };

        match outcome {
            Ok(Some(record)) => {
                if config.keeps_record(records.len()) {
                    records.push(record);
                }
            }
            Ok(None) => {}
            Err(e) if config.skip_invalid => {
                skipped += 1;
                tracing::warn!("Skipping line {}: {}", line_no, e);
            }
            Err(e) => return Err(e.context(format!("Malformed record on line {}", line_no))),
        }
    }

    let summary = classifier.summary().map_err(|e| match e {
        ClassifyError::EmptyInput if skipped > 0 => anyhow::anyhow!(
            "No events classified: all {} record(s) were skipped as malformed",
            skipped
        ),
        other => anyhow::Error::from(other),
    })?;

    let elapsed = start.elapsed();

    let latency = if config.stats_extended {
        LatencyStats::from_samples(classifier.aggregate().latencies())
    } else {
        None
    };

    tracing::info!(
        total = summary.total_processed,
        filtered = summary.filtered_count,
        collapsed = summary.collapsed_count,
        skipped,
        "replay complete in {:?}",
        elapsed
    );

    Ok(ReplayReport {
        records,
        summary,
        skipped,
        elapsed,
        latency,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SCENARIO: &str = r#"{"category": "noise"}
{"category": "signal", "bulk": true, "pid": 666, "layer": "App/L7"}
{"category": "signal", "pid": 4192, "layer": "Kernel/L0", "label": "Boundary Breach"}
"#;

    #[test]
    fn test_parse_line_skips_blank_and_comments() {
        assert!(parse_line("").unwrap().is_none());
        assert!(parse_line("   ").unwrap().is_none());
        assert!(parse_line("# recorded 14:00").unwrap().is_none());
        assert!(parse_line(r#"{"category": "noise"}"#).unwrap().is_some());
        assert!(parse_line("{not json").is_err());
    }

    #[test]
    fn test_replay_scenario() {
        let report = replay(Cursor::new(SCENARIO), &EngineConfig::default()).unwrap();
        assert_eq!(report.summary.total_processed, 3);
        assert_eq!(report.summary.filtered_count, 1);
        assert_eq!(report.summary.collapsed_count, 1);
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.skipped, 0);
        assert!(report.latency.is_none());
    }

    #[test]
    fn test_preview_limit_truncates_records_only() {
        let input: String = (0..10)
            .map(|i| {
                format!(
                    r#"{{"category": "signal", "pid": {}, "layer": "L", "label": "x"}}"#,
                    i
                ) + "\n"
            })
            .collect();
        let report = replay(Cursor::new(input), &EngineConfig::default()).unwrap();
        assert_eq!(report.records.len(), 3);
        assert_eq!(report.summary.mapped_count, 10);
    }

    #[test]
    fn test_malformed_line_fails_with_line_number() {
        let input = "{\"category\": \"noise\"}\n{\"category\": \"signal\"}\n";
        let err = replay(Cursor::new(input), &EngineConfig::default()).unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));
    }

    #[test]
    fn test_skip_invalid_counts_skipped() {
        let input = "{\"category\": \"noise\"}\n{oops\n{\"category\": \"signal\"}\n";
        let report = replay(Cursor::new(input), &EngineConfig::permissive()).unwrap();
        assert_eq!(report.skipped, 2);
        assert_eq!(report.summary.total_processed, 1);
    }

    #[test]
    fn test_invalid_utf8_line_is_skipped() {
        let mut input = b"{\"category\": \"noise\"}\n".to_vec();
        input.extend_from_slice(b"{\"category\": \"no\xffise\"}\n");
        input.extend_from_slice(b"{\"category\": \"noise\"}\n");

        let report = replay(Cursor::new(input.clone()), &EngineConfig::permissive()).unwrap();
        assert_eq!(report.summary.total_processed, 2);
        assert_eq!(report.skipped, 1);

        let err = replay(Cursor::new(input), &EngineConfig::default()).unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));
    }

    #[test]
    fn test_last_line_without_newline() {
        let input = "{\"category\": \"noise\"}\n{\"category\": \"noise\"}";
        let report = replay(Cursor::new(input), &EngineConfig::default()).unwrap();
        assert_eq!(report.summary.total_processed, 2);
    }

    #[test]
    fn test_empty_input_is_error() {
        let err = replay(Cursor::new("\n# nothing\n"), &EngineConfig::default()).unwrap_err();
        assert!(err.downcast_ref::<ClassifyError>().is_some());
    }

    #[test]
    fn test_all_skipped_is_error() {
        let err = replay(Cursor::new("{oops\n"), &EngineConfig::permissive()).unwrap_err();
        assert!(err.to_string().contains("skipped"));
    }

    #[test]
    fn test_stats_extended() {
        let report = replay(Cursor::new(SCENARIO), &EngineConfig::strict()).unwrap();
        let latency = report.latency.unwrap();
        assert_eq!(latency.samples, 3);
        assert_eq!(report.records.len(), 2);
    }

    #[test]
    fn test_throughput_zero_elapsed() {
        let mut report = replay(Cursor::new(SCENARIO), &EngineConfig::default()).unwrap();
        report.elapsed = Duration::ZERO;
        assert_eq!(report.throughput(), 0.0);

        report.elapsed = Duration::from_secs(1);
        assert_eq!(report.throughput(), 3.0);
    }
}
