//! Template renderer - Handlebars with HTML escaping disabled
//!
//! Section contents and the instruction text both carry literal markup
//! (`<b>`, `<code>`), so nothing may be escaped on the way through.

use handlebars::Handlebars;
use serde::Serialize;

use crate::error::{DigestError, Result};

/// Renders named templates using Handlebars templating
pub struct TemplateRenderer {
    handlebars: Handlebars<'static>,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer {
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        handlebars.register_escape_fn(handlebars::no_escape);
        Self { handlebars }
    }

    /// Register a named template for later use
    pub fn register_template(&mut self, name: &str, template: &str) -> Result<()> {
        self.handlebars
            .register_template_string(name, template)
            .map_err(|e| DigestError::Template(format!("Failed to register template '{}': {}", name, e)))
    }

    /// Render a previously registered template with any serializable context
    pub fn render<T: Serialize>(&self, name: &str, context: &T) -> Result<String> {
        self.handlebars
            .render(name, context)
            .map_err(|e| DigestError::Template(format!("Failed to render template '{}': {}", name, e)))
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.handlebars.get_template(name).is_some()
    }
}
