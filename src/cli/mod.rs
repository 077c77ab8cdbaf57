//! CLI module for digestr - command-line interface.
//!
//! The digest is a single parameterless unit of work; flags only select the
//! configuration file and log verbosity.

pub mod commands;

pub use commands::Cli;
