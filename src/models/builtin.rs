//! Platform models shipped with `lnf-runtime`.
//!
//! Registration names match the types' schema names, so a model published at
//! the top level and the same type embedded as a sub-definition of another
//! model land on one `components.schemas` key.

use lnf_runtime::models::identifiers::{OwnerHash, SessionToken, TagCode, Timestamp};
use lnf_runtime::models::owner::{
    LoginChallengeRequest, LoginChallengeResponse, LoginRequest, LoginResponseRequest,
    LoginSessionResponse, OnboardingInitRequest, OnboardingInitResponse,
    OnboardingPublicKeyRequest, OnboardingRequest, OwnerResponse, SessionRefreshRequest,
    SessionRefreshResponse,
};
use lnf_runtime::models::response::{
    ActionDetail, ApiResponse, ErrorModel, MetaModel, NoData,
};

use super::{ModelRegistry, ModelRole};

/// Register the envelope, identifier and owner models, in publication order.
pub fn register_platform_models(registry: &mut ModelRegistry) {
    // Generic
    registry.register::<ErrorModel>("ErrorModel");
    registry.register::<ActionDetail>("ActionDetail");
    registry.register::<MetaModel>("MetaModel");
    registry.register::<NoData>("NoData");
    registry.register::<ApiResponse>("ApiResponse");
    registry.register::<OwnerHash>("OwnerHash");
    registry.register::<TagCode>("TagCode");
    registry.register::<SessionToken>("SessionToken");
    registry.register::<Timestamp>("Timestamp");

    // Owner: onboarding
    registry
        .register::<OnboardingInitRequest>("OnboardingInitRequest")
        .with_tags(["owner"]);
    registry
        .register::<OnboardingPublicKeyRequest>("OnboardingPublicKeyRequest")
        .with_tags(["owner"]);
    registry
        .register::<OnboardingRequest>("OnboardingRequest")
        .with_role(ModelRole::Request)
        .with_tags(["owner"]);
    registry
        .register::<OnboardingInitResponse>("OnboardingInitResponse")
        .with_role(ModelRole::Response)
        .with_tags(["owner"]);

    // Owner: login
    registry
        .register::<LoginChallengeRequest>("LoginChallengeRequest")
        .with_tags(["owner"]);
    registry
        .register::<LoginResponseRequest>("LoginResponseRequest")
        .with_tags(["owner"]);
    registry
        .register::<LoginRequest>("LoginRequest")
        .with_role(ModelRole::Request)
        .with_tags(["owner"]);
    registry
        .register::<LoginChallengeResponse>("LoginChallengeResponse")
        .with_role(ModelRole::Response)
        .with_tags(["owner"]);
    registry
        .register::<LoginSessionResponse>("LoginSessionResponse")
        .with_role(ModelRole::Response)
        .with_tags(["owner"]);

    // Owner: session
    registry
        .register::<SessionRefreshRequest>("SessionRefreshRequest")
        .with_role(ModelRole::Request)
        .with_tags(["owner"]);
    registry
        .register::<SessionRefreshResponse>("SessionRefreshResponse")
        .with_role(ModelRole::Response)
        .with_tags(["owner"]);

    registry
        .register::<OwnerResponse>("OwnerResponse")
        .with_role(ModelRole::Response)
        .with_tags(["owner"]);
}
