//! Verdicts and their aggregation

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error code attached to a failed verdict or hook response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    /// A rule legitimately failed
    NonCompliant,
    /// The template could not be fetched, decoded, or evaluated
    InternalFailure,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::NonCompliant => write!(f, "NonCompliant"),
            ErrorCode::InternalFailure => write!(f, "InternalFailure"),
        }
    }
}

/// Outcome of one rule evaluation, or of a whole template
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub compliant: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,
    /// Resource the verdict is about, for per-resource rules
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
}

impl Verdict {
    pub fn compliant(message: impl Into<String>) -> Self {
        Self {
            compliant: true,
            message: message.into(),
            error_code: None,
            resource: None,
        }
    }

    pub fn non_compliant(message: impl Into<String>) -> Self {
        Self {
            compliant: false,
            message: message.into(),
            error_code: Some(ErrorCode::NonCompliant),
            resource: None,
        }
    }

    pub fn internal_failure(message: impl Into<String>) -> Self {
        Self {
            compliant: false,
            message: message.into(),
            error_code: Some(ErrorCode::InternalFailure),
            resource: None,
        }
    }

    /// Attach the resource this verdict is about
    pub fn for_resource(mut self, name: impl Into<String>) -> Self {
        self.resource = Some(name.into());
        self
    }
}

pub const ALL_COMPLIANT: &str = "All resources compliant";

/// Combine verdicts into one.
///
/// Any failure makes the result non-compliant with [`ErrorCode::NonCompliant`].
/// A lone failure keeps its message; several are listed in order. With no
/// failures, a single verdict is passed through and anything else reports
/// that all resources are compliant.
pub fn aggregate(verdicts: &[Verdict]) -> Verdict {
    let failures: Vec<&Verdict> = verdicts.iter().filter(|v| !v.compliant).collect();

    match failures.as_slice() {
        [] => match verdicts {
            [only] => Verdict {
                error_code: None,
                ..only.clone()
            },
            _ => Verdict::compliant(ALL_COMPLIANT),
        },
        [only] => Verdict {
            error_code: Some(ErrorCode::NonCompliant),
            ..(*only).clone()
        },
        many => {
            let messages: Vec<&str> = many.iter().map(|v| v.message.as_str()).collect();
            Verdict::non_compliant(format!(
                "{} compliance checks failed: {}",
                many.len(),
                messages.join("; ")
            ))
        }
    }
}
