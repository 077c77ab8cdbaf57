//! digestr - hourly server status digest
//!
//! Probes the host for operational signals, assembles them into an ordered
//! snapshot, renders a bounded request for a text summarizer, and delivers
//! the summary to a chat channel.

pub mod audit;
pub mod config;
pub mod delivery;
pub mod error;
pub mod llm;
pub mod probe;
pub mod report;
pub mod runner;
pub mod snapshot;

pub use error::{DigestError, Result};
