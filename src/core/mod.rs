// src/core/mod.rs

// The recon engine: everything below is independent of the terminal UI.

/// Typed failures: per-command `ExecutionFailure` and workflow-level `ReconError`.
pub mod error;

/// Process execution and concurrent fan-out.
pub mod executor;

/// Static catalogue of findings with descriptions and remediation.
pub mod knowledge_base;

/// Data structures shared by the parsers, the workflows and the UI.
pub mod models;

/// One parser per tool output grammar.
pub mod parsers;

/// The four reconnaissance workflows and the full scan.
pub mod recon;

pub mod target;
pub mod tools;
