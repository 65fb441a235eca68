//! Hook request and response envelopes

use serde::{Deserialize, Serialize};

use crate::rules::{ErrorCode, Verdict};

/// Invocation sent by the orchestrator around a stack operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookRequest {
    #[serde(default)]
    pub client_request_token: String,
    #[serde(default)]
    pub request_data: RequestData,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_type: Option<String>,
    /// URL of the template payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
}

impl HookRequest {
    pub fn new(client_request_token: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            client_request_token: client_request_token.into(),
            request_data: RequestData {
                target_type: None,
                payload: Some(payload.into()),
            },
        }
    }

    pub fn with_target_type(mut self, target_type: impl Into<String>) -> Self {
        self.request_data.target_type = Some(target_type.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HookStatus {
    Success,
    Failed,
}

/// Verdict in the envelope the orchestrator expects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookResponse {
    pub hook_status: HookStatus,
    pub message: String,
    pub client_request_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,
}

impl HookResponse {
    pub fn from_verdict(verdict: &Verdict, client_request_token: impl Into<String>) -> Self {
        let hook_status = if verdict.compliant {
            HookStatus::Success
        } else {
            HookStatus::Failed
        };
        Self {
            hook_status,
            message: verdict.message.clone(),
            client_request_token: client_request_token.into(),
            error_code: if verdict.compliant {
                None
            } else {
                verdict.error_code
            },
        }
    }

    pub fn is_success(&self) -> bool {
        self.hook_status == HookStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_request_deserializes_camel_case() {
        let request: HookRequest = serde_json::from_str(
            r#"{
                "clientRequestToken": "tok-1",
                "requestData": {"targetType": "STACK", "payload": "https://bucket/p.json"},
                "hookTypeName": "ignored"
            }"#,
        )
        .unwrap();
        assert_eq!(
            request,
            HookRequest::new("tok-1", "https://bucket/p.json").with_target_type("STACK")
        );
    }

    #[test]
    fn test_request_missing_fields_default() {
        let request: HookRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.client_request_token, "");
        assert_eq!(request.request_data.payload, None);
    }

    #[test]
    fn test_failed_response_serialization() {
        let response = HookResponse::from_verdict(&Verdict::non_compliant("nope"), "tok-2");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "hookStatus": "FAILED",
                "message": "nope",
                "clientRequestToken": "tok-2",
                "errorCode": "NonCompliant"
            })
        );
    }

    #[test]
    fn test_success_response_omits_error_code() {
        let response = HookResponse::from_verdict(&Verdict::compliant("fine"), "tok-3");
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(
            json,
            r#"{"hookStatus":"SUCCESS","message":"fine","clientRequestToken":"tok-3"}"#
        );
        assert!(response.is_success());
    }
}
