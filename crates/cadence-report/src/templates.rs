//! Report template sets
//!
//! A template set is a YAML document of named Handlebars templates:
//!
//! ```yaml
//! version: "1.0"
//! templates:
//!   validation_report:
//!     description: Stage-11 verdict as Markdown
//!     template: |
//!       # Validation Report
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;

use crate::ReportError;

/// The built-in templates shipped with the crate
pub const BUILTIN_TEMPLATES: &str = include_str!("../templates/report-templates.yaml");

/// Top-level templates file structure
#[derive(Debug, Clone, Deserialize)]
pub struct TemplatesFile {
    pub version: String,
    pub templates: BTreeMap<String, Template>,
}

/// A single template definition
#[derive(Debug, Clone, Deserialize)]
pub struct Template {
    pub description: String,
    pub template: String,
}

impl TemplatesFile {
    /// Parse a template set from YAML content
    pub fn from_yaml(yaml: &str) -> Result<Self, ReportError> {
        let file: TemplatesFile =
            serde_yaml::from_str(yaml).map_err(|e| ReportError::Template(e.to_string()))?;
        if file.templates.is_empty() {
            return Err(ReportError::Template("template set is empty".to_string()));
        }
        Ok(file)
    }

    /// Load a template set from a YAML file
    pub fn load(path: &str) -> Result<Self, ReportError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ReportError::Template(format!("failed to read {}: {}", path, e)))?;
        Self::from_yaml(&content)
    }

    /// The template set compiled into the crate
    pub fn builtin() -> Result<Self, ReportError> {
        Self::from_yaml(BUILTIN_TEMPLATES)
    }

    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.templates.keys().map(|s| s.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_set_parses() {
        let file = TemplatesFile::builtin().unwrap();
        assert_eq!(file.names(), vec!["calendar_summary", "validation_report"]);
        assert!(file.get("validation_report").unwrap().template.contains("Validation Report"));
    }

    #[test]
    fn test_empty_set_is_rejected() {
        let err = TemplatesFile::from_yaml("version: \"1.0\"\ntemplates: {}\n").unwrap_err();
        assert!(matches!(err, ReportError::Template(_)));
    }

    #[test]
    fn test_malformed_yaml() {
        assert!(TemplatesFile::from_yaml("templates: [").is_err());
    }
}
