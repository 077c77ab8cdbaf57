//! Probe runner - executes the probe battery
//!
//! Probes are independent: a failing, empty, or hung probe only affects its
//! own section. Execution may be concurrent, results always come back in
//! the order the probes were given.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use super::catalog::{BundleLine, Probe, ProbeKind, TIMED_OUT};
use super::command::{CommandExecutor, CommandOutput};
use crate::snapshot::Section;

/// How a probe's section text was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Command produced output
    Collected,
    /// Command succeeded with nothing to say; fallback used
    Empty,
    /// Command failed; fallback used
    Failed,
    /// Command exceeded its timeout
    TimedOut,
}

/// Text collected for one section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub section: Section,
    pub content: String,
    pub outcome: ProbeOutcome,
}

/// Runs probes through a command executor
pub struct ProbeRunner<E>
where
    E: CommandExecutor,
{
    executor: Arc<E>,
    timeout: Duration,
    concurrent: bool,
}

impl<E> ProbeRunner<E>
where
    E: CommandExecutor,
{
    pub fn new(executor: Arc<E>, timeout: Duration) -> Self {
        Self {
            executor,
            timeout,
            concurrent: true,
        }
    }

    /// Run probes one after another instead of all at once
    pub fn sequential(mut self) -> Self {
        self.concurrent = false;
        self
    }

    pub fn concurrent(mut self, concurrent: bool) -> Self {
        self.concurrent = concurrent;
        self
    }

    /// Upper bound on the wall-clock time of `run_all`
    pub fn ceiling(&self, probes: &[Probe]) -> Duration {
        if probes.is_empty() {
            return Duration::ZERO;
        }
        if self.concurrent {
            return self.timeout;
        }
        let commands: u32 = probes
            .iter()
            .map(|p| match &p.kind {
                ProbeKind::Command { .. } => 1,
                ProbeKind::Bundle(lines) => lines.len() as u32,
            })
            .sum();
        self.timeout * commands
    }

    /// Run every probe; one result per probe, in input order
    pub async fn run_all(&self, probes: &[Probe]) -> Vec<ProbeResult> {
        let results = if self.concurrent {
            join_all(probes.iter().map(|p| self.run(p))).await
        } else {
            let mut results = Vec::with_capacity(probes.len());
            for probe in probes {
                results.push(self.run(probe).await);
            }
            results
        };

        let degraded = results.iter().filter(|r| r.outcome != ProbeOutcome::Collected).count();
        log::info!("Ran {} probes ({} fell back)", results.len(), degraded);
        results
    }

    /// Run a single probe, substituting its fallback when it yields nothing
    pub async fn run(&self, probe: &Probe) -> ProbeResult {
        match &probe.kind {
            ProbeKind::Command { command } => {
                let output = self.executor.run(command, self.timeout).await;
                let (content, outcome) = match output {
                    CommandOutput::Success(text) if !text.trim().is_empty() => (text, ProbeOutcome::Collected),
                    CommandOutput::Success(_) => (probe.fallback().to_string(), ProbeOutcome::Empty),
                    CommandOutput::Failed(_) => (probe.fallback().to_string(), ProbeOutcome::Failed),
                    CommandOutput::TimedOut => (TIMED_OUT.to_string(), ProbeOutcome::TimedOut),
                };
                log::debug!("Probe {} -> {:?}", probe.name(), outcome);
                ProbeResult {
                    section: probe.section,
                    content,
                    outcome,
                }
            }
            ProbeKind::Bundle(lines) => {
                let rendered = if self.concurrent {
                    join_all(lines.iter().map(|l| self.run_line(l))).await
                } else {
                    let mut rendered = Vec::with_capacity(lines.len());
                    for line in lines {
                        rendered.push(self.run_line(line).await);
                    }
                    rendered
                };
                let outcomes: Vec<ProbeOutcome> = rendered.iter().map(|(_, outcome)| *outcome).collect();
                let outcome = bundle_outcome(&outcomes);
                log::debug!("Probe {} -> {:?}", probe.name(), outcome);
                ProbeResult {
                    section: probe.section,
                    content: rendered.into_iter().map(|(text, _)| text).collect::<Vec<_>>().join("\n"),
                    outcome,
                }
            }
        }
    }

    async fn run_line(&self, line: &BundleLine) -> (String, ProbeOutcome) {
        match self.executor.run(&line.command, self.timeout).await {
            CommandOutput::TimedOut => (line.render(TIMED_OUT), ProbeOutcome::TimedOut),
            output => match output.text() {
                Some(text) => (line.render(text), ProbeOutcome::Collected),
                None if output.is_failed() => (line.render(&line.fallback), ProbeOutcome::Failed),
                None => (line.render(&line.fallback), ProbeOutcome::Empty),
            },
        }
    }
}

/// Collected if any line produced output, otherwise the dominant reason it did not
fn bundle_outcome(lines: &[ProbeOutcome]) -> ProbeOutcome {
    if lines.is_empty() || lines.contains(&ProbeOutcome::Collected) {
        ProbeOutcome::Collected
    } else if lines.iter().all(|o| *o == ProbeOutcome::TimedOut) {
        ProbeOutcome::TimedOut
    } else if lines.contains(&ProbeOutcome::Failed) {
        ProbeOutcome::Failed
    } else {
        ProbeOutcome::Empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProbeConfig;
    use crate::probe::{ShellExecutor, standard_probes};
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Executor answering from a fixed table; unknown commands fail.
    struct ScriptedExecutor {
        answers: HashMap<String, CommandOutput>,
    }

    impl ScriptedExecutor {
        fn new(answers: Vec<(&str, CommandOutput)>) -> Self {
            Self {
                answers: answers.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
            }
        }
    }

    #[async_trait]
    impl CommandExecutor for ScriptedExecutor {
        async fn run(&self, command: &str, _timeout: Duration) -> CommandOutput {
            self.answers
                .get(command)
                .cloned()
                .unwrap_or_else(|| CommandOutput::Failed("unknown".to_string()))
        }
    }

    /// Executor giving the same answer to every command
    struct ConstantExecutor(CommandOutput);

    #[async_trait]
    impl CommandExecutor for ConstantExecutor {
        async fn run(&self, _command: &str, _timeout: Duration) -> CommandOutput {
            self.0.clone()
        }
    }

    async fn standard_contents(answer: CommandOutput) -> Vec<(Section, String, ProbeOutcome)> {
        let runner = ProbeRunner::new(Arc::new(ConstantExecutor(answer)), Duration::from_secs(1));
        runner
            .run_all(&standard_probes(&ProbeConfig::default()))
            .await
            .into_iter()
            .map(|r| (r.section, r.content, r.outcome))
            .collect()
    }

    const HOST_RESOURCES_FALLBACK: &str = "Memory: (unavailable)\n\
                                           Swap:   (unavailable)\n\
                                           Disk:   (unavailable)\n\
                                           Load:   (unavailable)\n\
                                           Uptime: (unavailable)";

    const NETWORK_SECURITY_FALLBACK: &str = "TCP stats:      (unavailable)\n\
                                             Established:    (unavailable) connections\n\
                                             TIME_WAIT:      (unavailable)\n\
                                             SYN_RECV:       (unavailable)  (>50 may indicate SYN flood)\n\
                                             Top source IPs:\n(none)\n\
                                             SSH failed auth (1h): (unavailable)\n\
                                             fail2ban status:\n(fail2ban not available)\n\
                                             fail2ban events (1h):\n(no events)";

    fn expected_fallbacks() -> Vec<(Section, &'static str)> {
        vec![
            (Section::ContainerInventory, "(no containers)"),
            (Section::ContainerUsage, "(no containers running)"),
            (Section::ServiceLogs, "(no logs)"),
            (Section::HostResources, HOST_RESOURCES_FALLBACK),
            (Section::EstablishedConnections, "(none)"),
            (Section::NetworkSecurity, NETWORK_SECURITY_FALLBACK),
            (Section::SystemErrors, "(none)"),
            (Section::MonitorLog, "(empty)"),
            (Section::BackupLog, "(empty)"),
        ]
    }

    #[tokio::test]
    async fn test_standard_probes_all_failing_give_exact_fallbacks() {
        let results = standard_contents(CommandOutput::Failed("command not found".to_string())).await;
        let contents: Vec<(Section, &str)> = results.iter().map(|(s, c, _)| (*s, c.as_str())).collect();
        assert_eq!(contents, expected_fallbacks());
        assert!(results.iter().all(|(_, _, o)| *o == ProbeOutcome::Failed));
    }

    #[tokio::test]
    async fn test_standard_probes_whitespace_only_give_exact_fallbacks() {
        let results = standard_contents(CommandOutput::Success("  \n\t \n".to_string())).await;
        let contents: Vec<(Section, &str)> = results.iter().map(|(s, c, _)| (*s, c.as_str())).collect();
        assert_eq!(contents, expected_fallbacks());
        assert!(results.iter().all(|(_, _, o)| *o == ProbeOutcome::Empty));
    }

    #[tokio::test]
    async fn test_bundle_outcome_when_nothing_collected() {
        let probe = Probe::bundle(
            Section::HostResources,
            vec![BundleLine::inline("Load: ", "empty"), BundleLine::inline("Uptime: ", "broken")],
        );
        let failed = runner(vec![("empty", ok(""))]).run(&probe).await;
        assert_eq!(failed.outcome, ProbeOutcome::Failed);

        let empty = runner(vec![("empty", ok("")), ("broken", ok(" "))]).run(&probe).await;
        assert_eq!(empty.outcome, ProbeOutcome::Empty);

        let hung = runner(vec![("empty", CommandOutput::TimedOut), ("broken", CommandOutput::TimedOut)])
            .run(&probe)
            .await;
        assert_eq!(hung.outcome, ProbeOutcome::TimedOut);
        assert_eq!(hung.content, "Load: (probe timed out)\nUptime: (probe timed out)");
    }

    #[test]
    fn test_bundle_outcome_rules() {
        use ProbeOutcome::*;
        assert_eq!(bundle_outcome(&[Failed, Collected]), Collected);
        assert_eq!(bundle_outcome(&[TimedOut, Empty]), Empty);
        assert_eq!(bundle_outcome(&[TimedOut, Failed, Empty]), Failed);
        assert_eq!(bundle_outcome(&[TimedOut]), TimedOut);
        assert_eq!(bundle_outcome(&[]), Collected);
    }

    fn runner(answers: Vec<(&str, CommandOutput)>) -> ProbeRunner<ScriptedExecutor> {
        ProbeRunner::new(Arc::new(ScriptedExecutor::new(answers)), Duration::from_secs(1))
    }

    fn ok(text: &str) -> CommandOutput {
        CommandOutput::Success(text.to_string())
    }

    #[tokio::test]
    async fn test_command_probe_collected() {
        let runner = runner(vec![("logs", ok("line 1\nline 2"))]);
        let result = runner.run(&Probe::command(Section::ServiceLogs, "logs")).await;
        assert_eq!(result.content, "line 1\nline 2");
        assert_eq!(result.outcome, ProbeOutcome::Collected);
    }

    #[tokio::test]
    async fn test_command_probe_fallbacks() {
        let runner = runner(vec![
            ("empty", ok("")),
            ("broken", CommandOutput::Failed("Error: No such container".to_string())),
            ("hung", CommandOutput::TimedOut),
        ]);

        let empty = runner.run(&Probe::command(Section::ContainerUsage, "empty")).await;
        assert_eq!(empty.content, "(no containers running)");
        assert_eq!(empty.outcome, ProbeOutcome::Empty);

        let broken = runner.run(&Probe::command(Section::ServiceLogs, "broken")).await;
        assert_eq!(broken.content, "(no logs)");
        assert_eq!(broken.outcome, ProbeOutcome::Failed);

        let hung = runner.run(&Probe::command(Section::SystemErrors, "hung")).await;
        assert_eq!(hung.content, "(probe timed out)");
        assert_eq!(hung.outcome, ProbeOutcome::TimedOut);
    }

    #[tokio::test]
    async fn test_bundle_probe_lines() {
        let runner = runner(vec![("count", ok("4")), ("jails", ok("Jail list: sshd")), ("hung", CommandOutput::TimedOut)]);
        let probe = Probe::bundle(
            Section::NetworkSecurity,
            vec![
                BundleLine::inline("Established:    ", "count").suffix(" connections"),
                BundleLine::block("fail2ban status:", "jails"),
                BundleLine::block("fail2ban events (1h):", "missing").fallback("(no events)"),
                BundleLine::inline("TCP stats:      ", "hung"),
            ],
        );

        let result = runner.run(&probe).await;
        assert_eq!(
            result.content,
            "Established:    4 connections\n\
             fail2ban status:\nJail list: sshd\n\
             fail2ban events (1h):\n(no events)\n\
             TCP stats:      (probe timed out)"
        );
        assert_eq!(result.outcome, ProbeOutcome::Collected);
    }

    #[tokio::test]
    async fn test_run_all_preserves_order_both_modes() {
        let probes = vec![
            Probe::command(Section::MonitorLog, "a"),
            Probe::command(Section::ContainerInventory, "b"),
            Probe::command(Section::BackupLog, "c"),
        ];
        let answers = || vec![("a", ok("A")), ("b", ok("B")), ("c", ok("C"))];

        for concurrent in [true, false] {
            let results = runner(answers()).concurrent(concurrent).run_all(&probes).await;
            let contents: Vec<&str> = results.iter().map(|r| r.content.as_str()).collect();
            assert_eq!(contents, vec!["A", "B", "C"]);
        }
    }

    #[tokio::test]
    async fn test_hung_probe_does_not_block_others() {
        let runner = ProbeRunner::new(Arc::new(ShellExecutor::new()), Duration::from_millis(200));
        let probes = vec![
            Probe::command(Section::SystemErrors, "sleep 10"),
            Probe::command(Section::MonitorLog, "echo monitor ok"),
        ];

        let started = std::time::Instant::now();
        let results = runner.run_all(&probes).await;
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(results[0].content, "(probe timed out)");
        assert_eq!(results[1].content, "monitor ok");
    }

    #[test]
    fn test_ceiling() {
        let probes = vec![
            Probe::command(Section::MonitorLog, "a"),
            Probe::bundle(
                Section::HostResources,
                vec![BundleLine::inline("x", "x"), BundleLine::inline("y", "y")],
            ),
        ];
        let concurrent = runner(vec![]);
        assert_eq!(concurrent.ceiling(&probes), Duration::from_secs(1));
        let sequential = runner(vec![]).sequential();
        assert_eq!(sequential.ceiling(&probes), Duration::from_secs(3));
    }
}
