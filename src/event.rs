//! Trace event model
//!
//! Events arrive in two shapes:
//! - [`RawTraceRecord`]: the untyped wire form (one JSON object per line),
//!   where every field is optional and nothing has been checked yet.
//! - [`TraceEvent`]: the validated form handed to the classifier. A signal
//!   event always has a subject pid and a layer, and a single (non-bulk)
//!   signal always has a semantic label.
//!
//! Validation happens exactly once, in `TryFrom<RawTraceRecord>`. After that
//! the classifier cannot see a malformed record.

use crate::classifier::ClassifyError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category tag of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Irrelevant event, filtered out before mapping
    Noise,
    /// Relevant event, mapped into the provenance graph
    Signal,
}

impl Category {
    /// Parse a category tag
    ///
    /// Accepts the short tags (`noise`, `signal`) as well as the long
    /// benchmark tags (`irrelevant_noise`, `attack_signal`).
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "noise" | "irrelevant_noise" => Some(Self::Noise),
            "signal" | "attack_signal" => Some(Self::Signal),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Noise => "noise",
            Self::Signal => "signal",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event timestamp, either epoch seconds or a wall-clock string ("14:00:01")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Epoch(f64),
    Clock(String),
}

/// Bulk or single signal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalKind {
    /// Fan-out operation collapsed into one supernode; sub-events are not kept
    Bulk,
    /// Individual event carrying its semantic label
    Single { label: String },
}

/// A validated signal event
#[derive(Debug, Clone, PartialEq)]
pub struct SignalEvent {
    /// Subject identifier (process id)
    pub pid: u32,
    /// Layer label (e.g., "Kernel/L0", "App/L7")
    pub layer: String,
    pub kind: SignalKind,
    /// Originating syscall name, if known (e.g., "sys_open")
    pub syscall: Option<String>,
    /// Syscall target argument (file path, socket address, executable)
    pub target: Option<String>,
    /// Record identifier from the trace log (e.g., "e_01")
    pub id: Option<String>,
    pub timestamp: Option<Timestamp>,
}

/// A validated trace event
#[derive(Debug, Clone, PartialEq)]
pub enum TraceEvent {
    Noise { timestamp: Option<Timestamp> },
    Signal(SignalEvent),
}

impl TraceEvent {
    /// Create a noise event
    pub fn noise() -> Self {
        Self::Noise { timestamp: None }
    }

    /// Create a single (1:1 mapped) signal event
    pub fn signal(pid: u32, layer: impl Into<String>, label: impl Into<String>) -> Self {
        Self::Signal(SignalEvent {
            pid,
            layer: layer.into(),
            kind: SignalKind::Single {
                label: label.into(),
            },
            syscall: None,
            target: None,
            id: None,
            timestamp: None,
        })
    }

    /// Create a bulk signal event
    pub fn bulk(pid: u32, layer: impl Into<String>) -> Self {
        Self::Signal(SignalEvent {
            pid,
            layer: layer.into(),
            kind: SignalKind::Bulk,
            syscall: None,
            target: None,
            id: None,
            timestamp: None,
        })
    }

    /// Attach the originating syscall and its target (no-op on noise)
    pub fn with_syscall(mut self, syscall: impl Into<String>, target: impl Into<String>) -> Self {
        if let Self::Signal(signal) = &mut self {
            signal.syscall = Some(syscall.into());
            signal.target = Some(target.into());
        }
        self
    }

    pub fn with_timestamp(mut self, ts: Timestamp) -> Self {
        match &mut self {
            Self::Noise { timestamp } => *timestamp = Some(ts),
            Self::Signal(signal) => signal.timestamp = Some(ts),
        }
        self
    }

    pub fn category(&self) -> Category {
        match self {
            Self::Noise { .. } => Category::Noise,
            Self::Signal(_) => Category::Signal,
        }
    }

    pub fn is_bulk(&self) -> bool {
        matches!(
            self,
            Self::Signal(SignalEvent {
                kind: SignalKind::Bulk,
                ..
            })
        )
    }
}

/// Untyped event record as read from a trace log
///
/// Field aliases accept the benchmark log layout (`type`, `isomorphic_mapping`)
/// and the engine trace layout, which names the syscall target after its
/// argument (`arg_filename`, `arg_ip`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTraceRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, alias = "type", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bulk: Option<bool>,
    #[serde(default, alias = "subject_id", skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<String>,
    #[serde(
        default,
        alias = "isomorphic_mapping",
        skip_serializing_if = "Option::is_none"
    )]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syscall: Option<String>,
    #[serde(
        default,
        alias = "arg_filename",
        alias = "arg_ip",
        skip_serializing_if = "Option::is_none"
    )]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
}

/// Treat a missing or blank string as absent
fn required(
    value: Option<String>,
    category: Category,
    field: &str,
) -> Result<String, ClassifyError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ClassifyError::missing_field(category.as_str(), field)),
    }
}

impl TryFrom<RawTraceRecord> for TraceEvent {
    type Error = ClassifyError;

    fn try_from(raw: RawTraceRecord) -> Result<Self, Self::Error> {
        let tag = raw
            .category
            .ok_or_else(|| ClassifyError::missing_field("unknown", "category"))?;
        let category = Category::parse(&tag).ok_or_else(|| ClassifyError::InvalidRecord {
            category: tag.clone(),
            reason: format!("unrecognized category tag `{}`", tag),
        })?;

        let bulk = raw.bulk.unwrap_or(false);

        match category {
            Category::Noise => {
                if bulk {
                    return Err(ClassifyError::InvalidRecord {
                        category: category.to_string(),
                        reason: "bulk flag is not allowed on a noise record".to_string(),
                    });
                }
                Ok(Self::Noise {
                    timestamp: raw.timestamp,
                })
            }
            Category::Signal => {
                let pid = raw
                    .pid
                    .ok_or_else(|| ClassifyError::missing_field(category.as_str(), "pid"))?;
                let layer = required(raw.layer, category, "layer")?;
                let kind = if bulk {
                    SignalKind::Bulk
                } else {
                    SignalKind::Single {
                        label: required(raw.label, category, "label")?,
                    }
                };

                Ok(Self::Signal(SignalEvent {
                    pid,
                    layer,
                    kind,
                    syscall: raw.syscall,
                    target: raw.target,
                    id: raw.id,
                    timestamp: raw.timestamp,
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<TraceEvent, ClassifyError> {
        let raw: RawTraceRecord = serde_json::from_str(json).unwrap();
        TraceEvent::try_from(raw)
    }

    #[test]
    fn test_category_parse_short_and_long_tags() {
        assert_eq!(Category::parse("noise"), Some(Category::Noise));
        assert_eq!(Category::parse("irrelevant_noise"), Some(Category::Noise));
        assert_eq!(Category::parse("Signal"), Some(Category::Signal));
        assert_eq!(Category::parse("attack_signal"), Some(Category::Signal));
        assert_eq!(Category::parse("chatter"), None);
    }

    #[test]
    fn test_noise_record_needs_only_category() {
        let event = parse(r#"{"category": "noise"}"#).unwrap();
        assert_eq!(event, TraceEvent::noise());
    }

    #[test]
    fn test_benchmark_layout_accepted() {
        let event = parse(
            r#"{"type": "attack_signal", "pid": 4192, "layer": "Network/L3",
                "isomorphic_mapping": "Lateral Movement",
                "syscall": "sys_connect", "target": "192.168.1.5",
                "timestamp": 1700000000.25}"#,
        )
        .unwrap();

        let TraceEvent::Signal(signal) = event else {
            panic!("expected signal");
        };
        assert_eq!(signal.pid, 4192);
        assert_eq!(
            signal.kind,
            SignalKind::Single {
                label: "Lateral Movement".to_string()
            }
        );
        assert_eq!(signal.syscall.as_deref(), Some("sys_connect"));
        assert_eq!(signal.timestamp, Some(Timestamp::Epoch(1700000000.25)));
    }

    #[test]
    fn test_engine_layout_argument_names() {
        let event = parse(
            r#"{"category": "signal", "pid": 4192, "layer": "Physical/L1", "label": "x",
                "syscall": "sys_open", "arg_filename": "/etc/shadow"}"#,
        )
        .unwrap();
        let TraceEvent::Signal(signal) = event else {
            panic!("expected signal");
        };
        assert_eq!(signal.target.as_deref(), Some("/etc/shadow"));

        let event = parse(
            r#"{"category": "signal", "pid": 4192, "layer": "Network/L3", "label": "x",
                "syscall": "sys_connect", "arg_ip": "192.168.1.50"}"#,
        )
        .unwrap();
        let TraceEvent::Signal(signal) = event else {
            panic!("expected signal");
        };
        assert_eq!(signal.target.as_deref(), Some("192.168.1.50"));
    }

    #[test]
    fn test_clock_timestamp() {
        let event = parse(r#"{"category": "noise", "timestamp": "14:00:01"}"#).unwrap();
        assert_eq!(
            event,
            TraceEvent::Noise {
                timestamp: Some(Timestamp::Clock("14:00:01".to_string()))
            }
        );
    }

    #[test]
    fn test_bulk_signal_does_not_need_label() {
        let event = parse(r#"{"category": "signal", "bulk": true, "pid": 666, "layer": "App/L7"}"#)
            .unwrap();
        assert!(event.is_bulk());
        assert_eq!(event, TraceEvent::bulk(666, "App/L7"));
    }

    #[test]
    fn test_signal_without_pid_is_invalid() {
        let err = parse(r#"{"category": "signal", "layer": "Kernel/L0", "label": "x"}"#)
            .unwrap_err();
        assert!(matches!(err, ClassifyError::InvalidRecord { .. }));
        assert!(err.to_string().contains("pid"));
    }

    #[test]
    fn test_single_signal_without_label_is_invalid() {
        let err = parse(r#"{"category": "signal", "pid": 1, "layer": "Kernel/L0"}"#).unwrap_err();
        assert!(err.to_string().contains("label"));
    }

    #[test]
    fn test_blank_layer_is_invalid() {
        let err =
            parse(r#"{"category": "signal", "pid": 1, "layer": "  ", "label": "x"}"#).unwrap_err();
        assert!(err.to_string().contains("layer"));
    }

    #[test]
    fn test_missing_category_is_invalid() {
        let err = parse(r#"{"pid": 1}"#).unwrap_err();
        assert!(err.to_string().contains("category"));
    }

    #[test]
    fn test_unknown_category_is_invalid() {
        let err = parse(r#"{"category": "chatter"}"#).unwrap_err();
        assert!(err.to_string().contains("chatter"));
    }

    #[test]
    fn test_bulk_noise_is_invalid() {
        let err = parse(r#"{"category": "noise", "bulk": true}"#).unwrap_err();
        assert!(err.to_string().contains("bulk"));
    }

    #[test]
    fn test_with_timestamp_on_both_variants() {
        let ts = Timestamp::Clock("14:02:45".to_string());
        let noise = TraceEvent::noise().with_timestamp(ts.clone());
        assert_eq!(noise, TraceEvent::Noise { timestamp: Some(ts.clone()) });

        let TraceEvent::Signal(signal) = TraceEvent::bulk(1, "App/L7").with_timestamp(ts.clone())
        else {
            panic!("expected signal");
        };
        assert_eq!(signal.timestamp, Some(ts));
    }

    #[test]
    fn test_with_syscall_ignored_on_noise() {
        let event = TraceEvent::noise().with_syscall("sys_open", "/etc/shadow");
        assert_eq!(event, TraceEvent::noise());
        assert_eq!(event.category(), Category::Noise);
    }
}
