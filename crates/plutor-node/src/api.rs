//! HTTP API server for the identity service.
//!
//! Exposes registration, email verification, profile management, trust
//! scoring and public profile lookups under `/api/v1`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use plutor_core::{
    DidMetadata, Profile, ProfileData, ProfileUpdate, PublicProfile, User, UserId, UserRecord,
    VerificationFacts,
};
use plutor_identity::TrustAssessment;
use plutor_onboarding::{IdentityLifecycleManager, OnboardingError, DEFAULT_SEARCH_LIMIT};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::mailer::{VerificationMailer, VerificationMessage};

/// Shared state for every handler.
pub struct AppState {
    pub manager: Arc<IdentityLifecycleManager>,
    pub mailer: Arc<dyn VerificationMailer>,
}

// --- Request / response types ---

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub wallet_address: String,
    pub email: String,
}

#[derive(Serialize, Deserialize)]
pub struct CreateUserResponse {
    pub user_id: UserId,
    pub did: String,
    pub wallet_address: String,
    pub email: String,
    pub verification_expires_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct VerifyTokenRequest {
    pub token: String,
}

#[derive(Serialize, Deserialize)]
pub struct VerifyTokenResponse {
    pub verified: bool,
}

#[derive(Deserialize)]
pub struct VerifyCodeRequest {
    pub code: String,
}

#[derive(Serialize, Deserialize)]
pub struct ExistsResponse {
    pub exists: bool,
}

#[derive(Serialize, Deserialize)]
pub struct CompleteProfileResponse {
    pub user: User,
    pub profile: Profile,
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    pub limit: Option<usize>,
}

#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub storage: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<Json<T>, ApiError>;

fn error_response(err: OnboardingError) -> ApiError {
    let status = match &err {
        OnboardingError::InvalidAddress(_) | OnboardingError::ValidationError(_) => {
            StatusCode::BAD_REQUEST
        }
        OnboardingError::DuplicateWallet(_)
        | OnboardingError::DuplicateEmail(_)
        | OnboardingError::InvalidStateTransition { .. } => StatusCode::CONFLICT,
        OnboardingError::VerificationNotFound
        | OnboardingError::UserNotFound(_)
        | OnboardingError::ProfileNotFound(_)
        | OnboardingError::DidMetadataNotFound(_) => StatusCode::NOT_FOUND,
        OnboardingError::Store(_) | OnboardingError::Internal(_) => {
            tracing::error!(error = %err, "request failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "internal error".into(),
                }),
            );
        }
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

fn not_found(what: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("{} not found", what),
        }),
    )
}

// --- Handlers ---

async fn handle_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        storage: state.manager.store().backend_name().to_string(),
    })
}

async fn handle_create_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<CreateUserResponse>), ApiError> {
    let created = state
        .manager
        .create_user(&req.wallet_address, &req.email)
        .await
        .map_err(error_response)?;

    let message = VerificationMessage {
        user_id: created.user.id,
        email: created.user.email.clone(),
        code: created.verification_code,
        token: created.verification_token,
        expires_at: created.verification_expires_at,
    };
    if let Err(e) = state.mailer.send_verification(&message).await {
        tracing::warn!(
            user_id = %created.user.id,
            mailer = state.mailer.name(),
            error = %e,
            "verification delivery failed"
        );
    }

    Ok((
        StatusCode::CREATED,
        Json(CreateUserResponse {
            user_id: created.user.id,
            did: created.did,
            wallet_address: created.user.wallet_address,
            email: created.user.email,
            verification_expires_at: created.verification_expires_at,
        }),
    ))
}

async fn handle_user_exists(
    State(state): State<Arc<AppState>>,
    Path(wallet): Path<String>,
) -> ApiResult<ExistsResponse> {
    let exists = state
        .manager
        .check_user_exists(&wallet)
        .map_err(error_response)?;
    Ok(Json(ExistsResponse { exists }))
}

async fn handle_user_by_wallet(
    State(state): State<Arc<AppState>>,
    Path(wallet): Path<String>,
) -> ApiResult<UserRecord> {
    state
        .manager
        .get_user_by_wallet(&wallet)
        .map_err(error_response)?
        .map(Json)
        .ok_or_else(|| not_found("user"))
}

async fn handle_user_by_did(
    State(state): State<Arc<AppState>>,
    Path(did): Path<String>,
) -> ApiResult<UserRecord> {
    state
        .manager
        .get_user_by_did(&did)
        .map_err(error_response)?
        .map(Json)
        .ok_or_else(|| not_found("user"))
}

async fn handle_complete_profile(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<UserId>,
    Json(profile): Json<ProfileData>,
) -> ApiResult<CompleteProfileResponse> {
    let (user, profile) = state
        .manager
        .complete_user_profile(user_id, profile)
        .await
        .map_err(error_response)?;
    Ok(Json(CompleteProfileResponse { user, profile }))
}

async fn handle_update_profile(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<UserId>,
    Json(update): Json<ProfileUpdate>,
) -> ApiResult<Profile> {
    state
        .manager
        .update_profile(user_id, update)
        .await
        .map(Json)
        .map_err(error_response)
}

async fn handle_verify_token(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifyTokenRequest>,
) -> ApiResult<VerifyTokenResponse> {
    let verified = state
        .manager
        .verify_email(&req.token)
        .await
        .map_err(error_response)?;
    Ok(Json(VerifyTokenResponse { verified }))
}

async fn handle_verify_code(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<UserId>,
    Json(req): Json<VerifyCodeRequest>,
) -> ApiResult<TrustAssessment> {
    state
        .manager
        .verify_email_with_code(user_id, &req.code)
        .await
        .map(Json)
        .map_err(error_response)
}

async fn handle_update_trust_score(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<UserId>,
    Json(facts): Json<VerificationFacts>,
) -> ApiResult<DidMetadata> {
    state
        .manager
        .update_trust_score(user_id, facts)
        .await
        .map(Json)
        .map_err(error_response)
}

async fn handle_did_metadata(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<UserId>,
) -> ApiResult<DidMetadata> {
    state
        .manager
        .get_did_metadata(user_id)
        .map_err(error_response)?
        .map(Json)
        .ok_or_else(|| not_found("DID metadata"))
}

async fn handle_public_profile(
    State(state): State<Arc<AppState>>,
    Path(did): Path<String>,
) -> ApiResult<PublicProfile> {
    state
        .manager
        .get_public_profile(&did)
        .map_err(error_response)?
        .map(Json)
        .ok_or_else(|| not_found("profile"))
}

async fn handle_search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Vec<PublicProfile>> {
    state
        .manager
        .search_users_by_company(&params.q, params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT))
        .map(Json)
        .map_err(error_response)
}

// --- Server ---

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(handle_health))
        .route("/api/v1/users", post(handle_create_user))
        .route("/api/v1/users/exists/{wallet}", get(handle_user_exists))
        .route("/api/v1/users/wallet/{wallet}", get(handle_user_by_wallet))
        .route("/api/v1/users/did/{did}", get(handle_user_by_did))
        .route(
            "/api/v1/users/{user_id}/profile",
            post(handle_complete_profile).patch(handle_update_profile),
        )
        .route("/api/v1/users/{user_id}/verify-code", post(handle_verify_code))
        .route(
            "/api/v1/users/{user_id}/trust-score",
            put(handle_update_trust_score),
        )
        .route("/api/v1/users/{user_id}/did-metadata", get(handle_did_metadata))
        .route("/api/v1/verify-email", post(handle_verify_token))
        .route("/api/v1/profiles", get(handle_search))
        .route("/api/v1/profiles/{did}", get(handle_public_profile))
        .with_state(state)
}

pub async fn start_api_server<F>(
    listen_addr: SocketAddr,
    state: Arc<AppState>,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    tracing::info!(%listen_addr, "HTTP API server started");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
