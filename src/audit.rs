//! Append-only audit trail of digest runs
//!
//! One line per significant step, prefixed with a UTC timestamp. The file is
//! opened, appended, and closed on every write; nothing is ever rewritten.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

/// Timestamp prefix of every audit line
pub const AUDIT_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

pub fn format_line(now: DateTime<Utc>, message: &str) -> String {
    format!("{} {}", now.format(AUDIT_TIME_FORMAT), message)
}

#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
    echo: bool,
}

impl AuditLog {
    /// Audit log at `path`, echoing each line to stdout
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            echo: true,
        }
    }

    /// Do not echo lines to stdout
    pub fn quiet(mut self) -> Self {
        self.echo = false;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one event line; a write failure is logged, never raised
    pub fn record(&self, message: &str) {
        let line = format_line(Utc::now(), message);
        if self.echo {
            println!("{}", line);
        }
        log::info!("{}", message);

        if let Err(e) = self.append(&line) {
            log::warn!("Failed to write audit log {}: {}", self.path.display(), e);
        }
    }

    /// Pass `result` through, recording `ERROR: {e}` when it failed
    pub fn record_err<T, E: std::fmt::Display>(&self, result: Result<T, E>) -> Result<T, E> {
        if let Err(e) = &result {
            self.record(&format!("ERROR: {:#}", e));
        }
        result
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{}", line)
    }

    /// Read back all recorded lines
    pub fn lines(&self) -> std::io::Result<Vec<String>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        Ok(fs::read_to_string(&self.path)?.lines().map(|l| l.to_string()).collect())
    }
}
