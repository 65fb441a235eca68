//! cfn-hook-guard - compliance checks for infrastructure templates
//!
//! This library recovers the resources declared in a template, applies
//! required-pair and cardinality rules to them, and folds the results into a
//! single verdict. The [`hook`] module wraps that pipeline in the
//! request/response envelope used by stack-operation hooks.
//!
//! # Example
//!
//! ```rust
//! use cfn_hook_guard::{check, RuleSet};
//!
//! let verdict = check(
//!     r#"
//! Resources:
//!   Bus:
//!     Type: AWS::Events::EventBus
//! "#,
//!     &RuleSet::event_bus_policy(),
//! );
//! assert!(!verdict.compliant);
//! assert_eq!(
//!     verdict.message,
//!     "AWS::Events::EventBus found without an associated AWS::Events::EventBusPolicy."
//! );
//! ```

pub mod error;
pub mod hook;
pub mod parser;
pub mod rules;
pub mod template;

pub use error::ParseError;
pub use hook::{
    FetchConfig, FetchError, FetchedPayload, HookError, HookHandler, HookRequest, HookResponse,
    HookStatus, HttpFetcher, TemplateFetcher,
};
pub use parser::{Mapping, Value};
pub use rules::{
    aggregate, CardinalityRule, ErrorCode, RequiredPairRule, RuleSet, RuleSetError, Verdict,
};
pub use template::{PropertyPath, Resource, Template};

/// Evaluate every rule of `rules` against a template and aggregate
pub fn evaluate_template(template: &Template, rules: &RuleSet) -> Verdict {
    let verdicts = rules::evaluate(template.resources(), rules);
    aggregate(&verdicts)
}

/// Parse template text and evaluate it
///
/// # Example
///
/// ```rust
/// use cfn_hook_guard::{check, RuleSet};
///
/// let verdict = check(
///     r#"{"Resources": {"Fn": {"Type": "AWS::Lambda::Function"}}}"#,
///     &RuleSet::lambda_multi_az(),
/// );
/// assert!(verdict.compliant);
/// assert_eq!(verdict.message, "Nothing to evaluate");
/// ```
pub fn check(source: &str, rules: &RuleSet) -> Verdict {
    evaluate_template(&Template::parse(source), rules)
}
