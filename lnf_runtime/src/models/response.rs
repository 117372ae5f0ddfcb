//! The response envelope every endpoint returns.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::kind_tag;
use super::owner::OwnerResponse;

kind_tag!(NoDataKind => "no_data");

/// Error details for failed API requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ErrorModel {
    /// Machine-readable error code, e.g. `not_found`, `forbidden`.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

/// An action the client is allowed to take after this response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ActionDetail {
    /// API endpoint, always a local path.
    pub endpoint: String,
    pub method: ActionMethod,
    /// Number of allowed attempts, if rate limited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<u32>,
    /// Rate window, e.g. `60s`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_window: Option<String>,
    pub description: String,
}

/// Response metadata: schema version, TTL, request id and rate limiting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MetaModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit_remaining: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit_reset: Option<i64>,
}

/// Empty payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct NoData {
    #[serde(default)]
    pub kind: NoDataKind,
}

/// Response data, discriminated by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ResponseData {
    Owner(OwnerResponse),
    NoData(NoData),
}

/// Standard API response wrapper for all endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ApiResponse {
    /// True on a successful request (HTTP 2xx).
    pub success: bool,
    /// Error object, present exactly when `success` is false.
    pub error: Option<ErrorModel>,
    pub data: ResponseData,
    /// Allowed follow-up actions keyed by name. May be empty.
    #[serde(default)]
    pub allowed_actions: BTreeMap<String, ActionDetail>,
    pub meta: Option<MetaModel>,
}

impl ApiResponse {
    pub fn ok(data: ResponseData) -> Self {
        Self {
            success: true,
            error: None,
            data,
            allowed_actions: BTreeMap::new(),
            meta: None,
        }
    }

    pub fn failure(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(ErrorModel {
                code: code.into(),
                message: message.into(),
            }),
            data: ResponseData::NoData(NoData::default()),
            allowed_actions: BTreeMap::new(),
            meta: None,
        }
    }

    pub fn with_action(mut self, name: impl Into<String>, action: ActionDetail) -> Self {
        self.allowed_actions.insert(name.into(), action);
        self
    }

    pub fn with_meta(mut self, meta: MetaModel) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Check the envelope is self-consistent: `success` and `error` must agree
    /// and every allowed action must point at a local endpoint.
    pub fn check(&self) -> Result<(), String> {
        match (self.success, &self.error) {
            (true, Some(err)) => {
                return Err(format!("successful response carries error '{}'", err.code))
            }
            (false, None) => return Err("failed response carries no error".to_string()),
            _ => {}
        }
        for (name, action) in &self.allowed_actions {
            if !action.endpoint.starts_with('/') || action.endpoint.starts_with("//") {
                return Err(format!(
                    "action '{}' endpoint '{}' is not a local path",
                    name, action.endpoint
                ));
            }
        }
        Ok(())
    }
}
