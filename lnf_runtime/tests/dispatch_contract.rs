#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Exercises the runtime contract the way a generated dispatcher does.

use lnf_runtime::invocation::CacheKey;
use lnf_runtime::models::owner::{OwnerResponse, OwnerResponseData, OwnerResponseKind};
use lnf_runtime::models::response::NoData;
use lnf_runtime::{
    error_response, extract_method_path, ApiResponse, HandlerError, HttpResponse,
    InvocationCache, LambdaContext, ResponseData,
};
use serde_json::{json, Value};

fn owner_get(_event: &Value, _ctx: &LambdaContext) -> Result<ApiResponse, HandlerError> {
    Ok(ApiResponse::ok(ResponseData::Owner(OwnerResponse {
        kind: OwnerResponseKind::Tag,
        data: OwnerResponseData::NoData(NoData::default()),
    })))
}

fn dispatch(event: &Value, cache: &mut InvocationCache) -> HttpResponse {
    let Some((method, path)) = extract_method_path(event) else {
        return HttpResponse::not_found();
    };
    let key = CacheKey::from_event(&method, &path, event);
    if method == "GET" {
        if let Some(hit) = cache.get(&key) {
            return hit.clone();
        }
    }
    let result = match (method.as_str(), path.as_str()) {
        ("GET", "/v1/owner") => owner_get(event, &LambdaContext::default()),
        ("DELETE", "/v1/owner") => Err(HandlerError::Forbidden("challenge required".into())),
        _ => return HttpResponse::not_found(),
    };
    let response = match result {
        Ok(envelope) => HttpResponse::from_envelope(&envelope),
        Err(err) => error_response(&err),
    };
    if method == "GET" {
        cache.put(key, response.clone());
    }
    response
}

#[test]
fn test_get_is_cached_and_enveloped() {
    let mut cache = InvocationCache::new();
    let event = json!({"httpMethod": "GET", "path": "/v1/owner"});
    let first = dispatch(&event, &mut cache);
    assert_eq!(first.status_code, 200);
    let body: Value = serde_json::from_str(&first.body).unwrap();
    assert_eq!(body["data"]["kind"], "owner_response");
    assert_eq!(body["data"]["data"]["kind"], "no_data");
    assert_eq!(cache.len(), 1);
    assert_eq!(dispatch(&event, &mut cache), first);
}

#[test]
fn test_handler_error_becomes_uniform_failure() {
    let mut cache = InvocationCache::new();
    let event = json!({"rawPath": "/v1/owner", "requestContext": {"http": {"method": "DELETE"}}});
    let resp = dispatch(&event, &mut cache);
    assert_eq!(resp.status_code, 403);
    let body: Value = serde_json::from_str(&resp.body).unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["message"], "challenge required");
    assert!(cache.is_empty());
}

#[test]
fn test_unknown_route_is_404() {
    let mut cache = InvocationCache::new();
    let event = json!({"httpMethod": "PATCH", "path": "/v1/nowhere"});
    assert_eq!(dispatch(&event, &mut cache).status_code, 404);
}
