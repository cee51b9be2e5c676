//! Event classification and aggregation
//!
//! One linear pass over the input: each event is either filtered as noise,
//! collapsed into an abstracted bulk record, or mapped 1:1. Every call,
//! whatever the branch, adds one latency sample and bumps the processed
//! count, so `filtered + collapsed + mapped == total_processed` always holds.
//!
//! # Example
//!
//! ```
//! use isocore::classifier::{EventClassifier, MappedRecord};
//! use isocore::event::TraceEvent;
//!
//! let mut classifier = EventClassifier::new();
//! assert!(classifier.classify(&TraceEvent::noise()).is_none());
//!
//! let record = classifier.classify(&TraceEvent::bulk(666, "App/L7")).unwrap();
//! assert!(record.is_bulk());
//!
//! let summary = classifier.summary().unwrap();
//! assert_eq!(summary.total_processed, 2);
//! assert_eq!(summary.noise_reduction_ratio, 0.5);
//! ```

use crate::event::{RawTraceRecord, SignalKind, Timestamp, TraceEvent};
use crate::mapping::{map_syscall, ProvenanceEdge};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Errors raised by the classifier
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifyError {
    #[error("Invalid {category} record: {reason}")]
    InvalidRecord { category: String, reason: String },

    #[error("Empty input: no events have been classified")]
    EmptyInput,
}

impl ClassifyError {
    pub(crate) fn missing_field(category: &str, field: &str) -> Self {
        Self::InvalidRecord {
            category: category.to_string(),
            reason: format!("missing required field `{}`", field),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClassifyError>;

/// Output of classifying one signal event
///
/// Both variants carry the source record's `id` and `timestamp` through
/// unchanged when the event had them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MappedRecord {
    /// Supernode standing in for a whole fan-out operation
    AbstractedBulk {
        pid: u32,
        layer: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<Timestamp>,
    },
    /// 1:1 mapping of a single event
    Direct {
        pid: u32,
        label: String,
        layer: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        edge: Option<ProvenanceEdge>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<Timestamp>,
    },
}

impl MappedRecord {
    pub fn pid(&self) -> u32 {
        match self {
            Self::AbstractedBulk { pid, .. } | Self::Direct { pid, .. } => *pid,
        }
    }

    pub fn layer(&self) -> &str {
        match self {
            Self::AbstractedBulk { layer, .. } | Self::Direct { layer, .. } => layer,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Self::AbstractedBulk { id, .. } | Self::Direct { id, .. } => id.as_deref(),
        }
    }

    pub fn timestamp(&self) -> Option<&Timestamp> {
        match self {
            Self::AbstractedBulk { timestamp, .. } | Self::Direct { timestamp, .. } => {
                timestamp.as_ref()
            }
        }
    }

    pub fn is_bulk(&self) -> bool {
        matches!(self, Self::AbstractedBulk { .. })
    }
}

/// Running aggregate over all classified events
///
/// Counts only ever grow. Shards classified independently can be combined
/// with [`Aggregate::merge`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregate {
    total_processed: u64,
    filtered_count: u64,
    collapsed_count: u64,
    latencies: Vec<Duration>,
}

impl Aggregate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_processed(&self) -> u64 {
        self.total_processed
    }

    pub fn filtered_count(&self) -> u64 {
        self.filtered_count
    }

    pub fn collapsed_count(&self) -> u64 {
        self.collapsed_count
    }

    /// Events that produced a 1:1 record
    pub fn mapped_count(&self) -> u64 {
        self.total_processed - self.filtered_count - self.collapsed_count
    }

    /// Per-event latency samples, in classification order
    pub fn latencies(&self) -> &[Duration] {
        &self.latencies
    }

    pub fn is_empty(&self) -> bool {
        self.total_processed == 0
    }

    /// Fold another shard into this one
    ///
    /// Counts add; the other shard's latency samples are appended after ours.
    pub fn merge(&mut self, other: Aggregate) {
        self.total_processed += other.total_processed;
        self.filtered_count += other.filtered_count;
        self.collapsed_count += other.collapsed_count;
        self.latencies.extend(other.latencies);
    }

    fn record(&mut self, outcome: Outcome, elapsed: Duration) {
        self.total_processed += 1;
        match outcome {
            Outcome::Filtered => self.filtered_count += 1,
            Outcome::Collapsed => self.collapsed_count += 1,
            Outcome::Mapped => {}
        }
        self.latencies.push(elapsed);
    }

    /// Mean latency over all samples
    pub fn mean_latency(&self) -> Result<Duration> {
        if self.latencies.is_empty() {
            return Err(ClassifyError::EmptyInput);
        }
        let total_nanos: u128 = self.latencies.iter().map(Duration::as_nanos).sum();
        let mean = total_nanos / self.latencies.len() as u128;
        Ok(Duration::from_nanos(mean as u64))
    }

    /// Fraction of processed events filtered as noise
    pub fn noise_reduction_ratio(&self) -> Result<f64> {
        if self.total_processed == 0 {
            return Err(ClassifyError::EmptyInput);
        }
        Ok(self.filtered_count as f64 / self.total_processed as f64)
    }
}

#[derive(Debug, Clone, Copy)]
enum Outcome {
    Filtered,
    Collapsed,
    Mapped,
}

/// Summary metrics derived from an [`Aggregate`]
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total_processed: u64,
    pub filtered_count: u64,
    pub collapsed_count: u64,
    pub mapped_count: u64,
    pub mean_latency: Duration,
    pub noise_reduction_ratio: f64,
}

impl Summary {
    pub fn mean_latency_us(&self) -> f64 {
        self.mean_latency.as_nanos() as f64 / 1_000.0
    }
}

impl TryFrom<&Aggregate> for Summary {
    type Error = ClassifyError;

    fn try_from(aggregate: &Aggregate) -> Result<Self> {
        Ok(Self {
            total_processed: aggregate.total_processed(),
            filtered_count: aggregate.filtered_count(),
            collapsed_count: aggregate.collapsed_count(),
            mapped_count: aggregate.mapped_count(),
            mean_latency: aggregate.mean_latency()?,
            noise_reduction_ratio: aggregate.noise_reduction_ratio()?,
        })
    }
}

/// Classifies events one at a time and owns the running aggregate
#[derive(Debug, Default)]
pub struct EventClassifier {
    aggregate: Aggregate,
}

impl EventClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume from a previously accumulated aggregate
    pub fn from_aggregate(aggregate: Aggregate) -> Self {
        Self { aggregate }
    }

    pub fn aggregate(&self) -> &Aggregate {
        &self.aggregate
    }

    pub fn into_aggregate(self) -> Aggregate {
        self.aggregate
    }

    /// Classify one event
    ///
    /// Returns `None` for noise, an abstracted bulk record for bulk signals,
    /// and a 1:1 record otherwise. The elapsed time of the call is recorded
    /// in every branch.
    pub fn classify(&mut self, event: &TraceEvent) -> Option<MappedRecord> {
        let start = Instant::now();

        let (outcome, record) = match event {
            TraceEvent::Noise { .. } => (Outcome::Filtered, None),
            TraceEvent::Signal(signal) => match &signal.kind {
                SignalKind::Bulk => (
                    Outcome::Collapsed,
                    Some(MappedRecord::AbstractedBulk {
                        pid: signal.pid,
                        layer: signal.layer.clone(),
                        id: signal.id.clone(),
                        timestamp: signal.timestamp.clone(),
                    }),
                ),
                SignalKind::Single { label } => {
                    let edge = signal.syscall.as_deref().and_then(|syscall| {
                        map_syscall(signal.pid, syscall, signal.target.as_deref())
                    });
                    (
                        Outcome::Mapped,
                        Some(MappedRecord::Direct {
                            pid: signal.pid,
                            label: label.clone(),
                            layer: signal.layer.clone(),
                            edge,
                            id: signal.id.clone(),
                            timestamp: signal.timestamp.clone(),
                        }),
                    )
                }
            },
        };

        self.aggregate.record(outcome, start.elapsed());
        tracing::debug!(?outcome, category = %event.category(), "classified event");

        record
    }

    /// Validate an untyped record, then classify it
    ///
    /// A record that fails validation is rejected before it reaches the
    /// aggregate, so counters only reflect well-formed events.
    pub fn classify_raw(&mut self, raw: RawTraceRecord) -> Result<Option<MappedRecord>> {
        let event = TraceEvent::try_from(raw)?;
        Ok(self.classify(&event))
    }

    /// Summary metrics over everything classified so far
    pub fn summary(&self) -> Result<Summary> {
        Summary::try_from(&self.aggregate)
    }
}
