//! Template rendering
//!
//! Uses Handlebars with Markdown output (no HTML escaping) and a few helpers:
//! - percent: format a unit score as a percentage (0.85 -> "85%")
//! - join: join an array with a separator
//! - count: length of an array

use handlebars::{handlebars_helper, Handlebars};
use serde_json::Value;

use crate::templates::TemplatesFile;
use crate::ReportError;

handlebars_helper!(percent: |value: f64| format!("{}%", (value * 100.0).round() as i64));

handlebars_helper!(join: |items: array, separator: str| {
    items
        .iter()
        .map(|v| match v.as_str() {
            Some(s) => s.to_string(),
            None => v.to_string(),
        })
        .collect::<Vec<_>>()
        .join(separator)
});

handlebars_helper!(count: |items: array| items.len());

/// Compiled renderer with registered helpers
pub struct TemplateRenderer {
    handlebars: Handlebars<'static>,
    templates: TemplatesFile,
}

impl TemplateRenderer {
    /// Compile every template in the set
    pub fn new(templates: TemplatesFile) -> Result<Self, ReportError> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        handlebars.register_escape_fn(handlebars::no_escape);

        handlebars.register_helper("percent", Box::new(percent));
        handlebars.register_helper("join", Box::new(join));
        handlebars.register_helper("count", Box::new(count));

        for (name, template) in &templates.templates {
            handlebars
                .register_template_string(name, &template.template)
                .map_err(|e| ReportError::Template(format!("{}: {}", name, e)))?;
        }

        tracing::debug!(templates = templates.templates.len(), "TemplateRenderer::new: compiled");
        Ok(Self { handlebars, templates })
    }

    /// Render a named template with data
    pub fn render(&self, template_name: &str, data: &Value) -> Result<String, ReportError> {
        if self.templates.get(template_name).is_none() {
            return Err(ReportError::UnknownTemplate(template_name.to_string()));
        }
        self.handlebars
            .render(template_name, data)
            .map_err(|e| ReportError::Render(e.to_string()))
    }

    pub fn list_templates(&self) -> Vec<&str> {
        self.templates.names()
    }
}
