//! Syscall to provenance-graph mapping
//!
//! Translates low-level syscalls into graph topology. Every edge starts at
//! the acting `Process` node; the target node kind depends on the syscall:
//!
//! ```text
//! sys_open*    (:Process)-[:ACCESSES]->(:File)        Confidentiality Breach
//! sys_connect  (:Process)-[:CONNECTS_TO]->(:Socket)   Lateral Movement
//! sys_execve   (:Process)-[:EXECUTES]->(:File)        Payload Execution
//! sys_write*   (:Process)-[:WRITES]->(:File)          Integrity Tampering
//! sys_setuid*  (:Process)-[:ESCALATES]->(:Identity)   Privilege Escalation
//! ```
//!
//! # Example
//!
//! ```
//! use isocore::mapping::{map_syscall, EdgeKind};
//!
//! let edge = map_syscall(4192, "sys_open", Some("/etc/shadow")).unwrap();
//! assert_eq!(edge.relationship, EdgeKind::Accesses);
//! assert_eq!(edge.to_string(), "Process(4192) -[ACCESSES]-> File(/etc/shadow)");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Node labels of the provenance schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Process,
    Socket,
    File,
    Identity,
}

/// Relationship types of the provenance schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeKind {
    Executes,
    ConnectsTo,
    Writes,
    Escalates,
    Accesses,
}

/// All node kinds in the schema
pub const NODE_KINDS: [NodeKind; 4] = [
    NodeKind::Process,
    NodeKind::Socket,
    NodeKind::File,
    NodeKind::Identity,
];

/// All edge kinds in the schema
pub const EDGE_KINDS: [EdgeKind; 5] = [
    EdgeKind::Executes,
    EdgeKind::ConnectsTo,
    EdgeKind::Writes,
    EdgeKind::Escalates,
    EdgeKind::Accesses,
];

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Process => "Process",
            Self::Socket => "Socket",
            Self::File => "File",
            Self::Identity => "Identity",
        }
    }
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Executes => "EXECUTES",
            Self::ConnectsTo => "CONNECTS_TO",
            Self::Writes => "WRITES",
            Self::Escalates => "ESCALATES",
            Self::Accesses => "ACCESSES",
        }
    }

    /// Node kind at the head of this relationship (the tail is always `Process`)
    pub fn target_kind(&self) -> NodeKind {
        match self {
            Self::ConnectsTo => NodeKind::Socket,
            Self::Escalates => NodeKind::Identity,
            Self::Executes | Self::Writes | Self::Accesses => NodeKind::File,
        }
    }

    /// Narrative label for the relationship
    pub fn isomorphism(&self) -> &'static str {
        match self {
            Self::Accesses => "Confidentiality Breach",
            Self::ConnectsTo => "Lateral Movement",
            Self::Executes => "Payload Execution",
            Self::Writes => "Integrity Tampering",
            Self::Escalates => "Privilege Escalation",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node reference: kind plus identifying key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphNode {
    pub kind: NodeKind,
    pub key: String,
}

impl GraphNode {
    pub fn new(kind: NodeKind, key: impl Into<String>) -> Self {
        Self {
            kind,
            key: key.into(),
        }
    }

    pub fn process(pid: u32) -> Self {
        Self::new(NodeKind::Process, pid.to_string())
    }
}

impl fmt::Display for GraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind, self.key)
    }
}

/// A directed provenance edge derived from one syscall
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceEdge {
    pub source: GraphNode,
    pub relationship: EdgeKind,
    pub target: GraphNode,
    pub isomorphism: String,
}

impl fmt::Display for ProvenanceEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -[{}]-> {}", self.source, self.relationship, self.target)
    }
}

/// Resolve the relationship for a syscall name (with or without `sys_` prefix)
pub fn edge_kind_for(syscall: &str) -> Option<EdgeKind> {
    let name = syscall.trim();
    let name = name.strip_prefix("sys_").unwrap_or(name);

    match name {
        "open" | "openat" | "openat2" => Some(EdgeKind::Accesses),
        "connect" => Some(EdgeKind::ConnectsTo),
        "execve" | "execveat" => Some(EdgeKind::Executes),
        "write" | "pwrite64" | "writev" | "pwritev" => Some(EdgeKind::Writes),
        "setuid" | "setreuid" | "setresuid" => Some(EdgeKind::Escalates),
        _ => None,
    }
}

/// Map a syscall issued by `pid` into a provenance edge
///
/// Returns `None` for syscalls outside the schema, or when the syscall has
/// no target to point the edge at.
pub fn map_syscall(pid: u32, syscall: &str, target: Option<&str>) -> Option<ProvenanceEdge> {
    let relationship = edge_kind_for(syscall)?;
    let target = target.map(str::trim).filter(|t| !t.is_empty())?;

    Some(ProvenanceEdge {
        source: GraphNode::process(pid),
        relationship,
        target: GraphNode::new(relationship.target_kind(), target),
        isomorphism: relationship.isomorphism().to_string(),
    })
}
