//! Resource extraction from a parsed document tree

use crate::parser::{self, Mapping, Value};

use super::Resource;

const RESOURCES_SECTION: &str = "Resources";
const TYPE_KEY: &str = "Type";
const PROPERTIES_KEY: &str = "Properties";

/// Extract resources from template text. Best effort: a document that cannot
/// be parsed yields no resources.
pub fn extract(text: &str) -> Vec<Resource> {
    parser::parse_document(text)
        .map(|doc| extract_from_value(&doc))
        .unwrap_or_default()
}

/// Extract resources from the `Resources` section of a document tree.
///
/// Entries without a non-empty scalar `Type` are skipped. A `Properties`
/// value that is not a mapping is treated as absent. Document order is kept;
/// names are already unique because mapping keys are.
pub fn extract_from_value(doc: &Value) -> Vec<Resource> {
    let Some(section) = doc.get(RESOURCES_SECTION).and_then(Value::as_mapping) else {
        return Vec::new();
    };

    let mut resources = Vec::new();
    for (name, body) in section.iter() {
        let Some(resource_type) = body
            .get(TYPE_KEY)
            .and_then(Value::as_scalar)
            .map(str::trim)
            .filter(|t| !t.is_empty())
        else {
            continue;
        };
        let properties = body
            .get(PROPERTIES_KEY)
            .and_then(Value::as_mapping)
            .cloned()
            .unwrap_or_else(Mapping::new);
        resources.push(Resource {
            name: name.to_string(),
            resource_type: resource_type.to_string(),
            properties,
        });
    }
    resources
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extract_in_document_order() {
        let resources = extract(
            "Parameters:\n  Env:\n    Type: String\nResources:\n  B:\n    Type: AWS::SQS::Queue\n  A:\n    Type: AWS::SNS::Topic\nOutputs:\n  Out:\n    Value: x\n",
        );
        let names: Vec<_> = resources.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[test]
    fn test_parameters_section_is_not_resources() {
        let resources = extract("Parameters:\n  Env:\n    Type: String\n");
        assert!(resources.is_empty());
    }

    #[test]
    fn test_resource_without_type_is_excluded() {
        let resources = extract(
            "Resources:\n  NoType:\n    Properties:\n      A: 1\n  EmptyType:\n    Type:\n  Ok:\n    Type: AWS::SQS::Queue\n",
        );
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].name, "Ok");
    }

    #[test]
    fn test_non_scalar_type_is_excluded() {
        let resources = extract(r#"{"Resources": {"Odd": {"Type": ["a"]}}}"#);
        assert!(resources.is_empty());
    }

    #[test]
    fn test_properties_not_a_mapping_are_empty() {
        let resources = extract("Resources:\n  Q:\n    Type: AWS::SQS::Queue\n    Properties: nope\n");
        assert_eq!(resources.len(), 1);
        assert!(resources[0].properties.is_empty());
    }

    #[test]
    fn test_resources_not_a_mapping() {
        assert!(extract("Resources: none\n").is_empty());
        assert!(extract(r#"{"Resources": []}"#).is_empty());
    }

    #[test]
    fn test_unparseable_json_yields_nothing() {
        assert!(extract(r#"{"Resources": "#).is_empty());
    }

    #[test]
    fn test_properties_keep_order() {
        let resources = extract(
            "Resources:\n  Fn:\n    Type: AWS::Lambda::Function\n    Properties:\n      Runtime: python3.12\n      Handler: index.handler\n      MemorySize: 128\n",
        );
        let keys: Vec<_> = resources[0].properties.keys().collect();
        assert_eq!(keys, vec!["Runtime", "Handler", "MemorySize"]);
    }
}
