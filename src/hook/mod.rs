//! Hook service layer
//!
//! Turns a [`HookRequest`] into a [`HookResponse`]: fetch the template
//! payload, recover its resources, apply the rule set and aggregate. Any
//! failure before evaluation is reported as an internal failure with a
//! generic message; the cause is only logged.

mod fetcher;
mod types;

pub use fetcher::{FetchConfig, FetchError, FetchedPayload, HttpFetcher, TemplateFetcher};
pub use types::{HookRequest, HookResponse, HookStatus, RequestData};

use thiserror::Error;
use tracing::{debug, error, info, info_span, warn};

use crate::rules::{RuleSet, Verdict};
use crate::template::Template;

pub const INTERNAL_FAILURE_MESSAGE: &str = "Failed to evaluate stack operation.";
pub const NOTHING_TO_VALIDATE: &str = "Stack update is compliant";

/// Causes of an internal failure
#[derive(Debug, Error)]
pub enum HookError {
    #[error("request carries no payload URL")]
    MissingPayloadUrl,

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("payload request returned status {status}")]
    Status { status: u16 },

    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload template field must be a string or an object, found {found}")]
    TemplateShape { found: &'static str },
}

/// Evaluates hook requests against one rule set
#[derive(Debug, Clone)]
pub struct HookHandler<F> {
    fetcher: F,
    rules: RuleSet,
}

impl<F: TemplateFetcher> HookHandler<F> {
    pub fn new(fetcher: F, rules: RuleSet) -> Self {
        Self { fetcher, rules }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Handle one request. Never fails; problems become FAILED responses.
    pub fn handle(&self, request: &HookRequest) -> HookResponse {
        let span = info_span!(
            "hook",
            token = %request.client_request_token,
            target_type = request.request_data.target_type.as_deref().unwrap_or("-")
        );
        let _guard = span.enter();

        let verdict = match self.evaluate_request(request) {
            Ok(verdict) => verdict,
            Err(err) => {
                error!(error = %err, "stack operation could not be evaluated");
                Verdict::internal_failure(INTERNAL_FAILURE_MESSAGE)
            }
        };

        info!(
            compliant = verdict.compliant,
            message = %verdict.message,
            "hook verdict"
        );
        HookResponse::from_verdict(&verdict, request.client_request_token.as_str())
    }

    fn evaluate_request(&self, request: &HookRequest) -> Result<Verdict, HookError> {
        let url = request
            .request_data
            .payload
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or(HookError::MissingPayloadUrl)?;

        let fetched = self.fetcher.fetch(url)?;
        debug!(status = fetched.status, bytes = fetched.body.len(), "fetched payload");
        if !fetched.is_success() {
            return Err(HookError::Status {
                status: fetched.status,
            });
        }

        let text = String::from_utf8(fetched.body)?;
        let payload: serde_json::Value = serde_json::from_str(&text)?;

        let Some(template) = template_from_payload(&payload)? else {
            info!("payload carries no template");
            return Ok(Verdict::compliant(NOTHING_TO_VALIDATE));
        };

        for diagnostic in template.diagnostics() {
            warn!(error = %diagnostic, "template syntax problem");
        }
        info!(
            resources = template.resources().len(),
            rules = self.rules.len(),
            "evaluating template"
        );
        Ok(crate::evaluate_template(&template, &self.rules))
    }
}

/// Locate the template inside a decoded payload.
///
/// `Ok(None)` means the payload has nothing to validate.
pub fn template_from_payload(payload: &serde_json::Value) -> Result<Option<Template>, HookError> {
    use serde_json::Value as Json;

    match payload.get("template") {
        Some(Json::String(text)) => Ok(Some(Template::parse(text))),
        Some(doc @ Json::Object(_)) => Ok(Some(Template::from_json(doc))),
        Some(Json::Null) | None => {
            if payload.get("Resources").is_some() {
                Ok(Some(Template::from_json(payload)))
            } else {
                Ok(None)
            }
        }
        Some(other) => Err(HookError::TemplateShape {
            found: json_kind(other),
        }),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
