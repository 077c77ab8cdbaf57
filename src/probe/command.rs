//! Command execution for probes
//!
//! Every probe is a read-only shell command. Execution is bounded by an
//! explicit timeout and captures stdout and stderr together. Each command
//! runs in its own process group; on timeout the whole group is killed.

use async_trait::async_trait;
use nix::errno::Errno;
use nix::sys::signal::{Signal, killpg};
use nix::unistd::Pid;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Result of running one probe command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    /// Exited zero; combined stdout+stderr, trimmed
    Success(String),
    /// Exited non-zero or could not be spawned; carries whatever was captured
    Failed(String),
    /// Did not finish within the timeout and was killed
    TimedOut,
}

impl CommandOutput {
    /// Non-empty output of a successful command
    pub fn text(&self) -> Option<&str> {
        match self {
            CommandOutput::Success(text) if !text.trim().is_empty() => Some(text),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, CommandOutput::Failed(_))
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, CommandOutput::TimedOut)
    }
}

/// Runs probe commands on the host
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn run(&self, command: &str, timeout: Duration) -> CommandOutput;
}

/// Executes commands through `sh -c`
#[derive(Debug, Clone, Default)]
pub struct ShellExecutor;

impl ShellExecutor {
    pub fn new() -> Self {
        Self
    }

    async fn execute(&self, command: &str, timeout: Duration) -> std::io::Result<Option<std::process::Output>> {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        cmd.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());
        // own process group, so a timeout can take down the whole pipeline
        cmd.process_group(0);
        cmd.kill_on_drop(true);

        let child = cmd.spawn()?;
        let pid = child.id();

        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(result) => result.map(Some),
            Err(_) => {
                if let Some(pid) = pid {
                    kill_process_group(pid);
                }
                Ok(None)
            }
        }
    }
}

/// SIGKILL every process in the group led by `pid`
fn kill_process_group(pid: u32) {
    let Ok(raw) = i32::try_from(pid) else {
        return;
    };
    match killpg(Pid::from_raw(raw), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => log::warn!("Failed to kill process group {}: {}", pid, e),
    }
}

#[async_trait]
impl CommandExecutor for ShellExecutor {
    async fn run(&self, command: &str, timeout: Duration) -> CommandOutput {
        match self.execute(command, timeout).await {
            Ok(Some(output)) => {
                let combined = format!(
                    "{}{}",
                    String::from_utf8_lossy(&output.stdout),
                    String::from_utf8_lossy(&output.stderr)
                );
                let text = combined.trim().to_string();
                if output.status.success() {
                    CommandOutput::Success(text)
                } else {
                    log::debug!("Probe command exited with {:?}: {}", output.status.code(), command);
                    CommandOutput::Failed(text)
                }
            }
            Ok(None) => {
                log::warn!("Probe command timed out after {}ms: {}", timeout.as_millis(), command);
                CommandOutput::TimedOut
            }
            Err(e) => {
                log::warn!("Probe command could not start: {}: {}", command, e);
                CommandOutput::Failed(e.to_string())
            }
        }
    }
}

/// Quote a value for safe interpolation into an `sh -c` command line
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timeout() -> Duration {
        Duration::from_secs(5)
    }

    #[tokio::test]
    async fn test_run_success_trims_output() {
        let output = ShellExecutor::new().run("echo '  hello  '", timeout()).await;
        assert_eq!(output, CommandOutput::Success("hello".to_string()));
        assert_eq!(output.text(), Some("hello"));
    }

    #[tokio::test]
    async fn test_run_combines_stdout_and_stderr() {
        let output = ShellExecutor::new().run("echo out; echo err >&2", timeout()).await;
        let text = output.text().unwrap();
        assert!(text.contains("out"));
        assert!(text.contains("err"));
    }

    #[tokio::test]
    async fn test_run_whitespace_only_has_no_text() {
        let output = ShellExecutor::new().run("printf '  \\n\\t\\n'", timeout()).await;
        assert_eq!(output, CommandOutput::Success(String::new()));
        assert!(output.text().is_none());
    }

    #[tokio::test]
    async fn test_run_failure() {
        let output = ShellExecutor::new().run("echo nope >&2; false", timeout()).await;
        assert_eq!(output, CommandOutput::Failed("nope".to_string()));
        assert!(output.text().is_none());
    }

    #[tokio::test]
    async fn test_run_missing_binary_fails() {
        let output = ShellExecutor::new().run("nonexistent_command_xyz123", timeout()).await;
        assert!(matches!(output, CommandOutput::Failed(_)));
    }

    #[tokio::test]
    async fn test_run_timeout() {
        let started = std::time::Instant::now();
        let output = ShellExecutor::new().run("sleep 10", Duration::from_millis(100)).await;
        assert!(output.is_timed_out());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    /// Command lines of live (non-zombie) processes
    #[cfg(target_os = "linux")]
    fn running_commands() -> Vec<String> {
        let mut commands = Vec::new();
        for entry in std::fs::read_dir("/proc").unwrap().flatten() {
            if let Ok(cmdline) = std::fs::read(entry.path().join("cmdline")) {
                commands.push(String::from_utf8_lossy(&cmdline).replace('\0', " "));
            }
        }
        commands
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_timeout_kills_whole_pipeline() {
        let output = ShellExecutor::new()
            .run("sleep 37.123 | cat | cat", Duration::from_millis(300))
            .await;
        assert!(output.is_timed_out());

        tokio::time::sleep(Duration::from_millis(300)).await;
        let survivors: Vec<String> = running_commands()
            .into_iter()
            .filter(|c| c.contains("sleep 37.123"))
            .collect();
        assert!(survivors.is_empty(), "left running: {:?}", survivors);
    }

    #[test]
    fn test_kill_missing_group_is_quiet() {
        kill_process_group(u32::MAX);
        kill_process_group(4_194_000);
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("plain"), "'plain'");
        assert_eq!(shell_quote("/var/log/my app.log"), "'/var/log/my app.log'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }

    #[tokio::test]
    async fn test_shell_quote_round_trips_through_sh() {
        let value = "a 'quoted' $HOME value";
        let output = ShellExecutor::new()
            .run(&format!("printf %s {}", shell_quote(value)), timeout())
            .await;
        assert_eq!(output.text(), Some(value));
    }
}
