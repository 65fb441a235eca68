//! Property resolution - follows a key path into a resource's properties

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::parser::Value;

use super::Resource;

/// Errors for malformed property paths
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PropertyPathError {
    #[error("property path is empty")]
    Empty,

    #[error("property path '{path}' has an empty segment")]
    EmptySegment { path: String },
}

/// Sequence of keys into a resource's properties, written `VpcConfig.SubnetIds`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyPath(Vec<String>);

impl PropertyPath {
    pub fn new<S: Into<String>>(segments: impl IntoIterator<Item = S>) -> Result<Self, PropertyPathError> {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(PropertyPathError::Empty);
        }
        if segments.iter().any(|s| s.is_empty()) {
            return Err(PropertyPathError::EmptySegment {
                path: segments.join("."),
            });
        }
        Ok(Self(segments))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl FromStr for PropertyPath {
    type Err = PropertyPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(PropertyPathError::Empty);
        }
        Self::new(s.split('.').map(str::trim))
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl Serialize for PropertyPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PropertyPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Resolve `path` against `resource.properties`.
///
/// Mapping segments look up keys, sequence segments are decimal indices.
/// A missing key, an out-of-range index, or a scalar before the last segment
/// all resolve to `None`; absence is the normal case for resources that do
/// not configure a property.
pub fn resolve<'a>(resource: &'a Resource, path: &PropertyPath) -> Option<&'a Value> {
    let (first, rest) = path.segments().split_first()?;
    let start = resource.properties.get(first)?;
    rest.iter().try_fold(start, |value, segment| match value {
        Value::Mapping(m) => m.get(segment),
        Value::Sequence(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        Value::Scalar(_) => None,
    })
}
