//! Run Controller - sequences one digest run.
//!
//! `init → collecting → requesting_summary → delivering → done`, or
//! `init → credential_error`, or `<any> → failed`.

mod digest_runner;

pub use digest_runner::{DigestRunner, RunOutcome, RunState};
