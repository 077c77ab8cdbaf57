//! The fixed battery of host probes
//!
//! Each probe maps to one snapshot section. Simple probes run a single
//! command; bundle probes run several commands and lay the answers out as
//! labelled lines.

use crate::config::ProbeConfig;
use crate::snapshot::Section;

use super::command::shell_quote;

/// Fallback for a single line of a bundle probe
pub const LINE_UNAVAILABLE: &str = "(unavailable)";

/// Substituted for any command that exceeded its timeout
pub const TIMED_OUT: &str = "(probe timed out)";

const DOCKER_PS: &str = "docker ps -a --format 'table {{.Names}}\\t{{.Status}}\\t{{.Image}}\\t{{.Ports}}'";

const DOCKER_STATS: &str = "docker stats --no-stream --format \
     '{{.Name}}: cpu={{.CPUPerc}} mem={{.MemUsage}} net={{.NetIO}} block={{.BlockIO}}'";

/// A named, read-only unit of collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    pub section: Section,
    pub kind: ProbeKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeKind {
    /// One command whose output is the whole section
    Command { command: String },
    /// Several labelled commands joined line by line
    Bundle(Vec<BundleLine>),
}

/// One labelled line of a bundle probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleLine {
    /// Label text, including its own padding
    pub label: String,
    pub command: String,
    pub fallback: String,
    /// Text appended after an inline value
    pub suffix: String,
    /// Put the value on the lines below the label instead of after it
    pub block: bool,
}

impl BundleLine {
    pub fn inline(label: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            command: command.into(),
            fallback: LINE_UNAVAILABLE.to_string(),
            suffix: String::new(),
            block: false,
        }
    }

    pub fn block(label: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            block: true,
            ..Self::inline(label, command)
        }
    }

    pub fn fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }

    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Render this line around a collected value
    pub fn render(&self, value: &str) -> String {
        if self.block {
            format!("{}\n{}", self.label, value)
        } else {
            format!("{}{}{}", self.label, value, self.suffix)
        }
    }
}

impl Probe {
    pub fn command(section: Section, command: impl Into<String>) -> Self {
        Self {
            section,
            kind: ProbeKind::Command {
                command: command.into(),
            },
        }
    }

    pub fn bundle(section: Section, lines: Vec<BundleLine>) -> Self {
        Self {
            section,
            kind: ProbeKind::Bundle(lines),
        }
    }

    pub fn name(&self) -> &'static str {
        self.section.key()
    }

    pub fn fallback(&self) -> &'static str {
        self.section.fallback()
    }
}

/// Build the full probe battery, one probe per section, in section order
pub fn standard_probes(config: &ProbeConfig) -> Vec<Probe> {
    vec![
        Probe::command(Section::ContainerInventory, DOCKER_PS),
        Probe::command(Section::ContainerUsage, DOCKER_STATS),
        Probe::command(Section::ServiceLogs, service_logs_command(config)),
        host_resources(),
        Probe::command(Section::EstablishedConnections, connections_command(config)),
        network_security(config),
        Probe::command(
            Section::SystemErrors,
            format!(
                "journalctl -p err --since '1 hour ago' --no-pager -q 2>/dev/null | tail -n {}",
                config.error_lines
            ),
        ),
        Probe::command(
            Section::MonitorLog,
            format!("tail -n {} {}", config.monitor_lines, shell_quote(&config.monitor_log.to_string_lossy())),
        ),
        Probe::command(
            Section::BackupLog,
            format!("tail -n {} {}", config.backup_lines, shell_quote(&config.backup_log.to_string_lossy())),
        ),
    ]
}

// no pipe, so a missing container surfaces as a non-zero exit;
// the container's stderr is merged in place to keep lines in time order
fn service_logs_command(config: &ProbeConfig) -> String {
    format!(
        "docker logs --since {} --tail {} {} 2>&1",
        shell_quote(&config.log_window),
        config.log_lines,
        shell_quote(&config.service_container)
    )
}

fn connections_command(config: &ProbeConfig) -> String {
    format!(
        "ss -Htnp state established 2>/dev/null | awk '{{print $3, \"→\", $4, $5}}' | head -n {}",
        config.max_connections
    )
}

fn host_resources() -> Probe {
    Probe::bundle(
        Section::HostResources,
        vec![
            BundleLine::inline(
                "Memory: ",
                r#"free -h | awk '/Mem:/{print $2" total, "$3" used, "$4" free"}'"#,
            ),
            BundleLine::inline("Swap:   ", r#"free -h | awk '/Swap:/{print $2" total, "$3" used"}'"#),
            BundleLine::inline(
                "Disk:   ",
                r#"df -h / | awk 'NR==2{print $2" total, "$3" used, "$5" use%"}'"#,
            ),
            BundleLine::inline("Load:   ", "uptime | awk -F'load average:' '{print $2}'"),
            BundleLine::inline("Uptime: ", "uptime -p"),
        ],
    )
}

fn network_security(config: &ProbeConfig) -> Probe {
    let top_ips = format!(
        "ss -Htn state established 2>/dev/null | awk '{{print $4}}' | sed 's/:[0-9]*$//' \
         | sort | uniq -c | sort -rn | head -n {}",
        config.top_source_ips
    );
    let ssh_fails = format!(
        "journalctl _SYSTEMD_UNIT={} --since '1 hour ago' --no-pager -q 2>/dev/null \
         | grep -i 'invalid\\|failed\\|error' | wc -l",
        shell_quote(&config.ssh_unit)
    );

    Probe::bundle(
        Section::NetworkSecurity,
        vec![
            BundleLine::inline("TCP stats:      ", "ss -s | awk '/TCP:/{print $0}'"),
            BundleLine::inline("Established:    ", "ss -Htn state established 2>/dev/null | wc -l")
                .suffix(" connections"),
            BundleLine::inline("TIME_WAIT:      ", "ss -Htn state time-wait 2>/dev/null | wc -l"),
            BundleLine::inline("SYN_RECV:       ", "ss -Htn state syn-recv 2>/dev/null | wc -l").suffix(
                format!("  (>{} may indicate SYN flood)", config.syn_flood_threshold),
            ),
            BundleLine::block("Top source IPs:", top_ips).fallback("(none)"),
            BundleLine::inline("SSH failed auth (1h): ", ssh_fails),
            BundleLine::block("fail2ban status:", "fail2ban-client status 2>/dev/null | head -n 5")
                .fallback("(fail2ban not available)"),
            BundleLine::block(
                "fail2ban events (1h):",
                "journalctl -u fail2ban --since '1 hour ago' --no-pager -q 2>/dev/null | tail -n 10",
            )
            .fallback("(no events)"),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{CommandExecutor, CommandOutput, ShellExecutor};
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn test_standard_probes_cover_every_section_in_order() {
        let probes = standard_probes(&ProbeConfig::default());
        let sections: Vec<Section> = probes.iter().map(|p| p.section).collect();
        assert_eq!(sections, Section::ALL.to_vec());
    }

    #[test]
    fn test_service_logs_command_uses_config() {
        let config = ProbeConfig {
            service_container: "api-gateway".to_string(),
            log_lines: 42,
            ..Default::default()
        };
        let probes = standard_probes(&config);
        let ProbeKind::Command { command } = &probes[2].kind else {
            panic!("service logs must be a single command");
        };
        assert!(command.contains("docker logs"));
        assert!(command.contains("--tail 42"));
        assert!(command.contains("'api-gateway'"));
        assert!(command.ends_with(" 2>&1"));
        assert!(!command.contains('|'));
    }

    fn service_logs(config: &ProbeConfig) -> String {
        let ProbeKind::Command { command } = &standard_probes(config)[2].kind else {
            panic!("service logs must be a single command");
        };
        command.clone()
    }

    #[tokio::test]
    async fn test_service_logs_keep_stderr_interleaved() {
        // a shell function shadows the docker binary
        let fake_docker = "docker() { echo start; echo 'ERROR upstream refused' >&2; echo 'retry ok'; }";
        let command = format!("{}; {}", fake_docker, service_logs(&ProbeConfig::default()));

        let output = ShellExecutor::new().run(&command, Duration::from_secs(5)).await;
        assert_eq!(output, CommandOutput::Success("start\nERROR upstream refused\nretry ok".to_string()));
    }

    #[tokio::test]
    async fn test_service_logs_missing_container_fails() {
        let fake_docker = "docker() { echo 'Error: No such container: openclaw-gateway' >&2; return 1; }";
        let command = format!("{}; {}", fake_docker, service_logs(&ProbeConfig::default()));

        let output = ShellExecutor::new().run(&command, Duration::from_secs(5)).await;
        assert!(matches!(output, CommandOutput::Failed(_)));
    }

    #[test]
    fn test_connection_limits_use_config() {
        let config = ProbeConfig {
            max_connections: 7,
            top_source_ips: 3,
            ..Default::default()
        };
        let probes = standard_probes(&config);

        let ProbeKind::Command { command } = &probes[4].kind else {
            panic!("connections must be a single command");
        };
        assert!(command.ends_with("head -n 7"));

        let ProbeKind::Bundle(lines) = &probes[5].kind else {
            panic!("network security must be a bundle");
        };
        let top = lines.iter().find(|l| l.label.starts_with("Top source IPs")).unwrap();
        assert!(top.command.ends_with("head -n 3"));
        assert_eq!(top.fallback, "(none)");
    }

    #[test]
    fn test_syn_recv_line_carries_threshold_hint() {
        let config = ProbeConfig {
            syn_flood_threshold: 75,
            ..Default::default()
        };
        let probes = standard_probes(&config);
        let ProbeKind::Bundle(lines) = &probes[5].kind else {
            panic!("network security must be a bundle");
        };
        let syn = lines.iter().find(|l| l.label.starts_with("SYN_RECV")).unwrap();
        assert_eq!(syn.render("3"), "SYN_RECV:       3  (>75 may indicate SYN flood)");
    }

    #[test]
    fn test_log_tail_paths_are_quoted() {
        let config = ProbeConfig {
            monitor_log: PathBuf::from("/var/log/my monitor.log"),
            monitor_lines: 15,
            ..Default::default()
        };
        let probes = standard_probes(&config);
        let ProbeKind::Command { command } = &probes[7].kind else {
            panic!("monitor log must be a single command");
        };
        assert_eq!(command, "tail -n 15 '/var/log/my monitor.log'");
    }

    #[test]
    fn test_docker_templates_are_literal() {
        let probes = standard_probes(&ProbeConfig::default());
        let ProbeKind::Command { command } = &probes[0].kind else {
            panic!("inventory must be a single command");
        };
        assert!(command.contains("{{.Names}}"));
        assert!(command.contains("docker ps -a"));
    }

    #[test]
    fn test_bundle_line_render() {
        let inline = BundleLine::inline("Established:    ", "true").suffix(" connections");
        assert_eq!(inline.render("5"), "Established:    5 connections");

        let block = BundleLine::block("fail2ban status:", "true");
        assert_eq!(block.render("Jail list: sshd"), "fail2ban status:\nJail list: sshd");
        assert_eq!(block.fallback, LINE_UNAVAILABLE);
    }

    #[test]
    fn test_probe_name_and_fallback() {
        let probe = Probe::command(Section::ServiceLogs, "true");
        assert_eq!(probe.name(), "service_logs");
        assert_eq!(probe.fallback(), "(no logs)");
    }
}
