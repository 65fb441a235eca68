//! Rule evaluation over an extracted resource set
//!
//! Every function here takes the resources as a shared slice and returns
//! fresh verdicts, so rules can be applied in any order with the same
//! result. Data-shape surprises never raise: a property that is missing or
//! not the shape a rule expects counts as nothing to evaluate.

use crate::template::{resolve, Resource};

use super::verdict::Verdict;
use super::{CardinalityRule, RequiredPairRule, RuleSet};

pub const NOTHING_TO_EVALUATE: &str = "Nothing to evaluate";
pub const DEPENDENCIES_SATISFIED: &str = "All dependencies are satisfied.";

/// Check that `rule.dependent_type` is present whenever `rule.required_type` is
pub fn evaluate_required_pair(resources: &[Resource], rule: &RequiredPairRule) -> Verdict {
    let has = |t: &str| resources.iter().any(|r| r.resource_type == t);

    if has(rule.required_type.as_str()) && !has(rule.dependent_type.as_str()) {
        Verdict::non_compliant(format!(
            "{} found without an associated {}.",
            rule.required_type, rule.dependent_type
        ))
    } else {
        Verdict::compliant(DEPENDENCIES_SATISFIED)
    }
}

/// Check the length of a list property on every resource of `rule.target_type`.
///
/// Verdicts come back in resource order.
pub fn evaluate_cardinality(resources: &[Resource], rule: &CardinalityRule) -> Vec<Verdict> {
    resources
        .iter()
        .filter(|r| r.resource_type == rule.target_type)
        .map(|resource| {
            let items = resolve(resource, &rule.property_path).and_then(|v| v.as_sequence());
            let Some(items) = items else {
                return Verdict::compliant(NOTHING_TO_EVALUATE).for_resource(&resource.name);
            };

            let count = items.len();
            let detail = format!(
                "{} has {} {}, at least {} required",
                rule.property_path,
                count,
                if count == 1 { "element" } else { "elements" },
                rule.min_count
            );
            let verdict = if count >= rule.min_count {
                Verdict::compliant(format!(
                    "{} '{}' is compliant: {}",
                    resource.resource_type, resource.name, detail
                ))
            } else {
                Verdict::non_compliant(format!(
                    "{} '{}' is non-compliant: {}",
                    resource.resource_type, resource.name, detail
                ))
            };
            verdict.for_resource(&resource.name)
        })
        .collect()
}

/// Apply every rule of a rule set: required pairs first, then cardinality
/// rules, each group in configuration order.
pub fn evaluate(resources: &[Resource], rules: &RuleSet) -> Vec<Verdict> {
    let pairs = rules
        .required_pairs
        .iter()
        .map(|rule| evaluate_required_pair(resources, rule));
    let cardinality = rules
        .cardinality
        .iter()
        .flat_map(|rule| evaluate_cardinality(resources, rule));
    pairs.chain(cardinality).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{Mapping, Value};
    use crate::rules::verdict::ErrorCode;
    use insta::assert_snapshot;

    fn event_bus_rule() -> RequiredPairRule {
        RequiredPairRule::new("AWS::Events::EventBus", "AWS::Events::EventBusPolicy")
    }

    fn subnet_rule() -> CardinalityRule {
        CardinalityRule::new(
            "AWS::Lambda::Function",
            "VpcConfig.SubnetIds".parse().expect("valid path"),
            2,
        )
    }

    fn lambda(name: &str, subnets: Option<usize>) -> Resource {
        let resource = Resource::new(name, "AWS::Lambda::Function");
        match subnets {
            None => resource,
            Some(n) => {
                let mut vpc = Mapping::new();
                vpc.insert(
                    "SubnetIds",
                    Value::Sequence((0..n).map(|i| Value::scalar(format!("subnet-{i}"))).collect()),
                );
                resource.with_property("VpcConfig", Value::Mapping(vpc))
            }
        }
    }

    #[test]
    fn test_required_pair_missing_dependent() {
        let resources = vec![Resource::new("Bus", "AWS::Events::EventBus")];
        let verdict = evaluate_required_pair(&resources, &event_bus_rule());
        assert!(!verdict.compliant);
        assert_eq!(verdict.error_code, Some(ErrorCode::NonCompliant));
        assert_snapshot!(
            &verdict.message,
            @"AWS::Events::EventBus found without an associated AWS::Events::EventBusPolicy."
        );
    }

    #[test]
    fn test_required_pair_satisfied() {
        let resources = vec![
            Resource::new("Bus", "AWS::Events::EventBus"),
            Resource::new("Policy", "AWS::Events::EventBusPolicy"),
        ];
        let verdict = evaluate_required_pair(&resources, &event_bus_rule());
        assert!(verdict.compliant);
        assert_eq!(verdict.message, DEPENDENCIES_SATISFIED);
    }

    #[test]
    fn test_required_pair_without_required_type() {
        let resources = vec![Resource::new("Policy", "AWS::Events::EventBusPolicy")];
        assert!(evaluate_required_pair(&resources, &event_bus_rule()).compliant);
        assert!(evaluate_required_pair(&[], &event_bus_rule()).compliant);
    }

    #[test]
    fn test_cardinality_absent_property() {
        let verdicts = evaluate_cardinality(&[lambda("Fn", None)], &subnet_rule());
        assert_eq!(verdicts.len(), 1);
        assert!(verdicts[0].compliant);
        assert_eq!(verdicts[0].message, NOTHING_TO_EVALUATE);
        assert_eq!(verdicts[0].resource.as_deref(), Some("Fn"));
    }

    #[test]
    fn test_cardinality_counts() {
        let rule = subnet_rule();
        for n in 0..=rule.min_count + 2 {
            let verdicts = evaluate_cardinality(&[lambda("Fn", Some(n))], &rule);
            assert_eq!(verdicts[0].compliant, n >= rule.min_count, "count {}", n);
        }
    }

    #[test]
    fn test_cardinality_message() {
        let verdicts = evaluate_cardinality(&[lambda("Fn", Some(1))], &subnet_rule());
        assert_snapshot!(
            &verdicts[0].message,
            @"AWS::Lambda::Function 'Fn' is non-compliant: VpcConfig.SubnetIds has 1 element, at least 2 required"
        );
    }

    #[test]
    fn test_cardinality_shape_mismatch_is_nothing_to_evaluate() {
        let resource = Resource::new("Fn", "AWS::Lambda::Function")
            .with_property("VpcConfig", Value::scalar("!Ref SharedVpcConfig"));
        let verdicts = evaluate_cardinality(&[resource], &subnet_rule());
        assert!(verdicts[0].compliant);
        assert_eq!(verdicts[0].message, NOTHING_TO_EVALUATE);
    }

    #[test]
    fn test_cardinality_ignores_other_types_and_keeps_order() {
        let resources = vec![
            lambda("Second", Some(1)),
            Resource::new("Queue", "AWS::SQS::Queue"),
            lambda("First", Some(3)),
        ];
        let verdicts = evaluate_cardinality(&resources, &subnet_rule());
        let names: Vec<_> = verdicts.iter().filter_map(|v| v.resource.as_deref()).collect();
        assert_eq!(names, vec!["Second", "First"]);
        assert!(!verdicts[0].compliant);
        assert!(verdicts[1].compliant);
    }

    #[test]
    fn test_evaluate_rule_set_order() {
        let rules = RuleSet::default();
        let resources = vec![lambda("Fn", Some(2)), Resource::new("Bus", "AWS::Events::EventBus")];
        let verdicts = evaluate(&resources, &rules);
        assert_eq!(verdicts.len(), 2);
        assert!(!verdicts[0].compliant);
        assert!(verdicts[1].compliant);
    }
}
