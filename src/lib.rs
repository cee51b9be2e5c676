//! isocore - Isomorphic provenance mapping engine
//!
//! This library classifies syscall-like trace events as noise or signal,
//! collapses bulk operations into single supernodes, maps the remaining
//! signal events onto a provenance graph schema, and accumulates latency
//! and noise-reduction statistics over the run.

pub mod classifier;
pub mod cli;
pub mod config;
pub mod event;
pub mod json_output;
pub mod mapping;
pub mod replay;
pub mod stats;
pub mod text_output;
