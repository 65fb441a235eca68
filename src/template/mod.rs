//! Templates and the resources recovered from them
//!
//! A [`Template`] is built once from source text (or an already decoded JSON
//! document) and is immutable afterwards. Building never fails: whatever
//! resources can be recovered are kept, and syntax problems in bracketed
//! documents are recorded as diagnostics.
//!
//! # Example
//!
//! ```rust
//! use cfn_hook_guard::template::Template;
//!
//! let template = Template::parse(
//!     "Resources:\n  Bus:\n    Type: AWS::Events::EventBus\n",
//! );
//! assert_eq!(template.resources().len(), 1);
//! assert_eq!(template.resources()[0].resource_type, "AWS::Events::EventBus");
//! ```

mod extract;
mod resolver;

pub use extract::{extract, extract_from_value};
pub use resolver::{resolve, PropertyPath, PropertyPathError};

use serde::Serialize;

use crate::parser::{self, Mapping, Value};
use crate::ParseError;

/// A single declared infrastructure unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resource {
    /// Logical name, unique within its template
    pub name: String,
    /// Namespaced type identifier, never empty
    #[serde(rename = "type")]
    pub resource_type: String,
    pub properties: Mapping,
}

impl Resource {
    pub fn new(name: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resource_type: resource_type.into(),
            properties: Mapping::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key, value);
        self
    }
}

/// An infrastructure template and its recovered resources
#[derive(Debug, Clone)]
pub struct Template {
    source: Option<String>,
    resources: Vec<Resource>,
    diagnostics: Vec<ParseError>,
}

impl Template {
    /// Build a template from source text in either supported encoding
    pub fn parse(source: &str) -> Self {
        let (resources, diagnostics) = match parser::parse_document(source) {
            Ok(doc) => (extract_from_value(&doc), Vec::new()),
            Err(errors) => (Vec::new(), errors),
        };
        Self {
            source: Some(source.to_string()),
            resources,
            diagnostics,
        }
    }

    /// Build a template from a document already decoded by a JSON decoder
    pub fn from_json(doc: &serde_json::Value) -> Self {
        Self {
            source: None,
            resources: extract_from_value(&Value::from(doc)),
            diagnostics: Vec::new(),
        }
    }

    /// Source text, if the template was built from text
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Resources in document order
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn resource(&self, name: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.name == name)
    }

    /// Whether any resource has the given type
    pub fn has_type(&self, resource_type: &str) -> bool {
        self.resources
            .iter()
            .any(|r| r.resource_type == resource_type)
    }

    /// Syntax errors found while parsing a bracketed document
    pub fn diagnostics(&self) -> &[ParseError] {
        &self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_markup_template() {
        let template = Template::parse(
            "Resources:\n  Bus:\n    Type: AWS::Events::EventBus\n  Policy:\n    Type: AWS::Events::EventBusPolicy\n",
        );
        assert!(template.diagnostics().is_empty());
        assert!(template.has_type("AWS::Events::EventBus"));
        assert!(template.has_type("AWS::Events::EventBusPolicy"));
        assert!(template.resource("Policy").is_some());
        assert!(template.source().is_some());
    }

    #[test]
    fn test_broken_json_keeps_diagnostics() {
        let template = Template::parse(r#"{"Resources": {"Bus": {"Type": "AWS::Events::EventBus"}"#);
        assert!(template.resources().is_empty());
        assert!(!template.diagnostics().is_empty());
    }

    #[test]
    fn test_from_json() {
        let doc = serde_json::json!({
            "Resources": {
                "Fn": {"Type": "AWS::Lambda::Function", "Properties": {"Timeout": 3}}
            }
        });
        let template = Template::from_json(&doc);
        assert!(template.source().is_none());
        let fn_resource = template.resource("Fn").expect("resource");
        assert_eq!(fn_resource.properties.get("Timeout"), Some(&Value::scalar("3")));
    }

    #[test]
    fn test_resource_serializes_with_type_field() {
        let resource = Resource::new("Q", "AWS::SQS::Queue")
            .with_property("DelaySeconds", Value::scalar("5"));
        let json = serde_json::to_value(&resource).unwrap();
        assert_eq!(json["type"], "AWS::SQS::Queue");
        assert_eq!(json["properties"]["DelaySeconds"], "5");
    }
}
