//! Request and response models for the owner endpoints.
//!
//! Partial models carry a fixed `kind`; combined request models wrap them in
//! a `data` union so handlers can branch on the step of a multi-step flow.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::identifiers::{OwnerHash, PublicKey, Timestamp};
use super::kind_tag;
use super::response::NoData;

kind_tag!(OnboardingInitKind => "onboarding_init");
kind_tag!(OnboardingPublicKeyKind => "onboarding_public_key");
kind_tag!(LoginChallengeKind => "login_challenge");
kind_tag!(LoginResponseKind => "login_response");
kind_tag!(SessionRefreshKind => "session_refresh");
kind_tag!(OwnerResponseKind => "owner_response");

// Onboarding

/// First onboarding step: register the owner hash and password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct OnboardingInitRequest {
    #[serde(default)]
    pub kind: OnboardingInitKind,
    pub owner_hash: OwnerHash,
    pub password_hash: String,
}

/// Second onboarding step: upload the owner's public key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct OnboardingPublicKeyRequest {
    #[serde(default)]
    pub kind: OnboardingPublicKeyKind,
    /// Owner's public key in PEM format
    pub public_key: PublicKey,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum OnboardingStep {
    Init(OnboardingInitRequest),
    PublicKey(OnboardingPublicKeyRequest),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct OnboardingRequest {
    pub data: OnboardingStep,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct OnboardingInitResponse {
    #[serde(default)]
    pub kind: OnboardingInitKind,
    /// Random entropy for cryptographic purposes
    pub random_entropy: String,
    /// Expiration time of the session token
    pub expires_at: Timestamp,
}

// Login

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct LoginChallengeRequest {
    #[serde(default)]
    pub kind: LoginChallengeKind,
    pub owner_hash: OwnerHash,
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct LoginResponseRequest {
    #[serde(default)]
    pub kind: LoginResponseKind,
    pub challenge_response: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum LoginStep {
    Challenge(LoginChallengeRequest),
    Response(LoginResponseRequest),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub data: LoginStep,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct LoginChallengeResponse {
    #[serde(default)]
    pub kind: LoginChallengeKind,
    /// Challenge string the client must sign
    pub challenge: String,
    /// Expiration time of the challenge and session token
    pub expires_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct LoginSessionResponse {
    #[serde(default)]
    pub kind: LoginResponseKind,
    /// Expiration time of the session token
    pub expires_at: Timestamp,
}

// Session

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SessionRefreshRequest {
    #[serde(default)]
    pub kind: SessionRefreshKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SessionRefreshResponse {
    #[serde(default)]
    pub kind: SessionRefreshKind,
    /// New expiration time of the refreshed session token
    pub expires_at: Timestamp,
}

/// Payload variants an owner endpoint can answer with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum OwnerResponseData {
    LoginChallenge(LoginChallengeResponse),
    LoginSession(LoginSessionResponse),
    OnboardingInit(OnboardingInitResponse),
    SessionRefresh(SessionRefreshResponse),
    NoData(NoData),
}

/// Wrapper placed in [`ResponseData`](super::response::ResponseData) by owner handlers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct OwnerResponse {
    #[serde(default)]
    pub kind: OwnerResponseKind,
    pub data: OwnerResponseData,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use serde_json::json;

    #[test]
    fn test_login_request_selects_step_by_kind() {
        let raw = json!({"data": {"kind": "login_response", "challenge_response": "sig"}});
        let req: LoginRequest = serde_json::from_value(raw).unwrap();
        assert!(matches!(req.data, LoginStep::Response(_)));
    }

    #[test]
    fn test_kind_literal_is_serialized() {
        let resp = SessionRefreshResponse {
            kind: SessionRefreshKind::Tag,
            expires_at: Timestamp(1_800_000_000),
        };
        let value = serde_json::to_value(resp).unwrap();
        assert_eq!(value["kind"], "session_refresh");
    }

    #[test]
    fn test_partial_models_expose_kind_property() {
        let schema = schemars::schema_for!(LoginChallengeResponse);
        let kind = &schema.as_value()["properties"]["kind"];
        assert_eq!(kind["const"], "login_challenge");
    }
}
