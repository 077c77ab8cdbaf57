//! Report Request Builder - instruction template and rendering
//!
//! This module turns a snapshot into the text request for the summarizer.
//! All interpretation (thresholds, anomaly narrative, language) is left to
//! the summarizer through the template's instruction contract.

mod builder;
mod render;
mod template;

pub use builder::{REPORT_TIME_FORMAT, ReportRequestBuilder, format_report_time};
pub use render::TemplateRenderer;
pub use template::{REPORT_TEMPLATE, REPORT_TEMPLATE_VERSION};
