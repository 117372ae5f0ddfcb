//! Invocation plumbing shared by every generated dispatcher.
//!
//! A dispatcher receives the raw gateway event, resolves `(method, path)`,
//! calls the handler method and turns its `Result<ApiResponse, HandlerError>`
//! into an [`HttpResponse`]. Successful GET responses are memoized in the
//! [`InvocationCache`] for as long as the execution environment stays warm.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::models::response::ApiResponse;

/// Extract the HTTP method and path from a gateway event.
///
/// REST API (v1) events carry `httpMethod` and `path`; HTTP API (v2) events
/// carry `requestContext.http.method` and `rawPath` (falling back to
/// `requestContext.http.path`).
pub fn extract_method_path(event: &Value) -> Option<(String, String)> {
    if let (Some(method), Some(path)) = (
        event.get("httpMethod").and_then(Value::as_str),
        event.get("path").and_then(Value::as_str),
    ) {
        return Some((method.to_uppercase(), path.to_string()));
    }
    let http = event.get("requestContext").and_then(|rc| rc.get("http"));
    let method = http?.get("method").and_then(Value::as_str)?;
    let path = event
        .get("rawPath")
        .and_then(Value::as_str)
        .or_else(|| http?.get("path").and_then(Value::as_str))?;
    Some((method.to_uppercase(), path.to_string()))
}

/// Per-invocation metadata handed to handler methods.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LambdaContext {
    pub request_id: String,
    pub function_name: String,
}

/// Gateway-shaped HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpResponse {
    pub status_code: u16,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl HttpResponse {
    pub fn json<T: Serialize>(status_code: u16, body: &T) -> Result<Self, HandlerError> {
        let body = serde_json::to_string(body)
            .map_err(|e| HandlerError::Internal(format!("failed to serialize response: {e}")))?;
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        Ok(Self {
            status_code,
            headers,
            body,
        })
    }

    pub fn not_found() -> Self {
        Self {
            status_code: 404,
            headers: BTreeMap::new(),
            body: "Endpoint not found".to_string(),
        }
    }

    /// Convert a handler envelope into a response, rejecting inconsistent ones.
    pub fn from_envelope(envelope: &ApiResponse) -> Self {
        if let Err(reason) = envelope.check() {
            tracing::error!(%reason, "handler returned an invalid response envelope");
            return error_response(&HandlerError::Internal(format!(
                "invalid response envelope: {reason}"
            )));
        }
        let status = if envelope.success { 200 } else { 400 };
        Self::json(status, envelope).unwrap_or_else(|e| error_response(&e))
    }
}

/// Failure raised by a handler method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl HandlerError {
    pub fn status_code(&self) -> u16 {
        match self {
            HandlerError::BadRequest(_) => 400,
            HandlerError::Unauthorized(_) => 401,
            HandlerError::Forbidden(_) => 403,
            HandlerError::NotFound(_) => 404,
            HandlerError::Conflict(_) => 409,
            HandlerError::Internal(_) => 500,
        }
    }

    /// Machine-readable code placed in [`ErrorModel::code`](crate::ErrorModel).
    pub fn code(&self) -> &'static str {
        match self {
            HandlerError::BadRequest(_) => "bad_request",
            HandlerError::Unauthorized(_) => "unauthorized",
            HandlerError::Forbidden(_) => "forbidden",
            HandlerError::NotFound(_) => "not_found",
            HandlerError::Conflict(_) => "conflict",
            HandlerError::Internal(_) => "internal_error",
        }
    }

    fn message(&self) -> &str {
        match self {
            HandlerError::BadRequest(m)
            | HandlerError::Unauthorized(m)
            | HandlerError::Forbidden(m)
            | HandlerError::NotFound(m)
            | HandlerError::Conflict(m)
            | HandlerError::Internal(m) => m,
        }
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

impl std::error::Error for HandlerError {}

/// Wrap a handler failure into the uniform error envelope.
///
/// Internal errors never expose their message to the client.
pub fn error_response(err: &HandlerError) -> HttpResponse {
    let message = match err {
        HandlerError::Internal(_) => "Internal server error",
        other => other.message(),
    };
    let envelope = ApiResponse::failure(err.code(), message);
    match HttpResponse::json(err.status_code(), &envelope) {
        Ok(resp) => resp,
        Err(_) => HttpResponse {
            status_code: 500,
            headers: BTreeMap::new(),
            body: "Internal server error".to_string(),
        },
    }
}

/// Key of a cached GET response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
}

impl CacheKey {
    pub fn from_event(method: &str, path: &str, event: &Value) -> Self {
        let query = event
            .get("queryStringParameters")
            .filter(|q| !q.is_null())
            .map(Value::to_string);
        Self {
            method: method.to_string(),
            path: path.to_string(),
            query,
        }
    }
}

/// In-memory cache that lives as long as the execution environment is warm.
#[derive(Debug, Default)]
pub struct InvocationCache {
    entries: HashMap<CacheKey, HttpResponse>,
}

impl InvocationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<&HttpResponse> {
        self.entries.get(key)
    }

    /// Store a response. Only successful responses are kept.
    pub fn put(&mut self, key: CacheKey, response: HttpResponse) {
        if response.status_code == 200 {
            self.entries.insert(key, response);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_rest_v1_event() {
        let event = json!({"httpMethod": "get", "path": "/v1/owner"});
        assert_eq!(
            extract_method_path(&event),
            Some(("GET".to_string(), "/v1/owner".to_string()))
        );
    }

    #[test]
    fn test_extract_http_v2_event() {
        let event = json!({
            "rawPath": "/v1/owner/login",
            "requestContext": {"http": {"method": "POST", "path": "/ignored"}}
        });
        assert_eq!(
            extract_method_path(&event),
            Some(("POST".to_string(), "/v1/owner/login".to_string()))
        );

        let no_raw = json!({"requestContext": {"http": {"method": "GET", "path": "/v1/x"}}});
        assert_eq!(extract_method_path(&no_raw).unwrap().1, "/v1/x");
        assert_eq!(extract_method_path(&json!({})), None);
    }

    #[test]
    fn test_error_response_hides_internal_message() {
        let resp = error_response(&HandlerError::Internal("db password wrong".into()));
        assert_eq!(resp.status_code, 500);
        assert!(!resp.body.contains("password"));
        let body: Value = serde_json::from_str(&resp.body).unwrap();
        assert_eq!(body["error"]["code"], "internal_error");
    }

    #[test]
    fn test_cache_only_keeps_success() {
        let mut cache = InvocationCache::new();
        let key = CacheKey::from_event("GET", "/v1/owner", &json!({}));
        cache.put(key.clone(), HttpResponse::not_found());
        assert!(cache.is_empty());
        cache.put(key.clone(), HttpResponse::json(200, &json!({"ok": true})).unwrap());
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&key).is_some());
    }
}
