//! Snapshot - the ordered section mapping built once per run
//!
//! A snapshot always carries every section, in the fixed display order,
//! whatever happened to the individual probes.

use serde::Serialize;

use crate::probe::ProbeResult;

/// Display order of the snapshot sections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    ContainerInventory,
    ContainerUsage,
    ServiceLogs,
    HostResources,
    EstablishedConnections,
    NetworkSecurity,
    SystemErrors,
    MonitorLog,
    BackupLog,
}

impl Section {
    pub const ALL: [Section; 9] = [
        Section::ContainerInventory,
        Section::ContainerUsage,
        Section::ServiceLogs,
        Section::HostResources,
        Section::EstablishedConnections,
        Section::NetworkSecurity,
        Section::SystemErrors,
        Section::MonitorLog,
        Section::BackupLog,
    ];

    /// Section name as it appears in the report request delimiter
    pub fn key(&self) -> &'static str {
        match self {
            Section::ContainerInventory => "docker_containers",
            Section::ContainerUsage => "docker_stats",
            Section::ServiceLogs => "service_logs",
            Section::HostResources => "system_resources",
            Section::EstablishedConnections => "established_connections",
            Section::NetworkSecurity => "network_security",
            Section::SystemErrors => "system_errors",
            Section::MonitorLog => "monitor_log",
            Section::BackupLog => "backup_log",
        }
    }

    /// Text substituted when the section's probe yields nothing
    pub fn fallback(&self) -> &'static str {
        match self {
            Section::ContainerInventory => "(no containers)",
            Section::ContainerUsage => "(no containers running)",
            Section::ServiceLogs => "(no logs)",
            Section::HostResources => "(unavailable)",
            Section::EstablishedConnections => "(none)",
            Section::NetworkSecurity => "(unavailable)",
            Section::SystemErrors => "(none)",
            Section::MonitorLog => "(empty)",
            Section::BackupLog => "(empty)",
        }
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// One named section of a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotEntry {
    pub section: Section,
    pub content: String,
}

/// Ordered mapping of section name to collected text
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snapshot {
    entries: Vec<SnapshotEntry>,
}

impl Snapshot {
    /// Assemble probe results into the fixed section order.
    ///
    /// Never fails: a section without a result gets its fallback text and a
    /// duplicate result for a section is ignored.
    pub fn assemble(results: impl IntoIterator<Item = ProbeResult>) -> Self {
        let mut collected: Vec<Option<String>> = vec![None; Section::ALL.len()];

        for result in results {
            let Some(index) = Section::ALL.iter().position(|s| *s == result.section) else {
                continue;
            };
            if collected[index].is_some() {
                log::warn!("Duplicate probe result for section {}, keeping the first", result.section);
                continue;
            }
            collected[index] = Some(result.content);
        }

        let entries = Section::ALL
            .iter()
            .zip(collected)
            .map(|(section, content)| SnapshotEntry {
                section: *section,
                content: content.unwrap_or_else(|| {
                    log::warn!("No probe result for section {}", section);
                    section.fallback().to_string()
                }),
            })
            .collect();

        Self { entries }
    }

    pub fn get(&self, section: Section) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.section == section)
            .map(|e| e.content.as_str())
    }

    /// Replace one section's text, keeping its position
    pub fn set(&mut self, section: Section, content: impl Into<String>) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.section == section) {
            entry.content = content.into();
        }
    }

    pub fn entries(&self) -> &[SnapshotEntry] {
        &self.entries
    }

    pub fn keys(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.section.key()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
