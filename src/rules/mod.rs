//! Compliance rules, their evaluation, and verdict aggregation

mod config;
mod engine;
mod verdict;

pub use config::{RuleSet, RuleSetError};
pub use engine::{
    evaluate, evaluate_cardinality, evaluate_required_pair, DEPENDENCIES_SATISFIED,
    NOTHING_TO_EVALUATE,
};
pub use verdict::{aggregate, ErrorCode, Verdict, ALL_COMPLIANT};

use serde::{Deserialize, Serialize};

use crate::template::PropertyPath;

/// A template containing `required_type` must also contain `dependent_type`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredPairRule {
    pub required_type: String,
    pub dependent_type: String,
}

impl RequiredPairRule {
    pub fn new(required_type: impl Into<String>, dependent_type: impl Into<String>) -> Self {
        Self {
            required_type: required_type.into(),
            dependent_type: dependent_type.into(),
        }
    }
}

/// Every resource of `target_type` must have at least `min_count` elements
/// in the list at `property_path`, when that list is configured at all
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardinalityRule {
    pub target_type: String,
    pub property_path: PropertyPath,
    pub min_count: usize,
}

impl CardinalityRule {
    pub fn new(target_type: impl Into<String>, property_path: PropertyPath, min_count: usize) -> Self {
        Self {
            target_type: target_type.into(),
            property_path,
            min_count,
        }
    }
}
