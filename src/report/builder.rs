//! Report request builder
//!
//! Renders a snapshot plus the instruction contract into the single text
//! request sent to the summarizer. Pure: the same snapshot and timestamp
//! always give the same bytes. No interpretation of section content happens
//! here.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::render::TemplateRenderer;
use super::template::{REPORT_TEMPLATE, REPORT_TEMPLATE_VERSION};
use crate::config::ReportConfig;
use crate::error::{DigestError, Result};
use crate::snapshot::Snapshot;

const TEMPLATE_NAME: &str = "digest";

/// Timestamp format used in the request and the delivered header
pub const REPORT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

pub fn format_report_time(now: DateTime<Utc>) -> String {
    now.format(REPORT_TIME_FORMAT).to_string()
}

#[derive(Serialize)]
struct SectionView<'a> {
    title: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct RequestContext<'a> {
    server_name: &'a str,
    server_label: String,
    server_description: &'a str,
    timestamp: String,
    service_container: &'a str,
    max_lines: u32,
    prose_language: &'a str,
    technical_language: &'a str,
    sections: Vec<SectionView<'a>>,
}

/// Builds the summarizer request from a snapshot
pub struct ReportRequestBuilder {
    renderer: TemplateRenderer,
    report: ReportConfig,
    service_container: String,
    version: String,
}

impl ReportRequestBuilder {
    /// Build with the configured template: `template_path` if set, else the built-in one
    pub fn new(report: &ReportConfig, service_container: &str) -> Result<Self> {
        match &report.template_path {
            Some(path) => {
                let template = std::fs::read_to_string(path).map_err(|e| {
                    DigestError::Template(format!("Failed to load template from {}: {}", path.display(), e))
                })?;
                log::info!("Using report template from {}", path.display());
                Self::with_template(report, service_container, &template, &format!("file:{}", path.display()))
            }
            None => Self::with_template(report, service_container, REPORT_TEMPLATE, REPORT_TEMPLATE_VERSION),
        }
    }

    pub fn with_template(
        report: &ReportConfig,
        service_container: &str,
        template: &str,
        version: &str,
    ) -> Result<Self> {
        let mut renderer = TemplateRenderer::new();
        renderer.register_template(TEMPLATE_NAME, template)?;
        Ok(Self {
            renderer,
            report: report.clone(),
            service_container: service_container.to_string(),
            version: version.to_string(),
        })
    }

    /// Identifier of the instruction contract in use
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Render the request text for `snapshot` at `now`
    pub fn build(&self, snapshot: &Snapshot, now: DateTime<Utc>) -> Result<String> {
        let context = RequestContext {
            server_name: &self.report.server_name,
            server_label: self.report.server_name.to_uppercase(),
            server_description: &self.report.server_description,
            timestamp: format_report_time(now),
            service_container: &self.service_container,
            max_lines: self.report.max_lines,
            prose_language: &self.report.prose_language,
            technical_language: &self.report.technical_language,
            sections: snapshot
                .entries()
                .iter()
                .map(|e| SectionView {
                    title: e.section.key(),
                    content: &e.content,
                })
                .collect(),
        };
        self.renderer.render(TEMPLATE_NAME, &context)
    }
}
