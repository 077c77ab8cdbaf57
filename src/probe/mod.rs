//! Probe Runner - read-only host signal collection
//!
//! This module provides:
//! - CommandExecutor trait and the shell-backed implementation
//! - The fixed probe battery, one probe per snapshot section
//! - ProbeRunner, which runs the battery with per-probe timeouts

pub mod catalog;
pub mod command;
pub mod runner;

pub use catalog::{BundleLine, LINE_UNAVAILABLE, Probe, ProbeKind, TIMED_OUT, standard_probes};
pub use command::{CommandExecutor, CommandOutput, ShellExecutor, shell_quote};
pub use runner::{ProbeOutcome, ProbeResult, ProbeRunner};
