//! Auth API Endpoints
//!
//! - POST /auth/login - tenant-aware password login
//! - POST /auth/force-reset - complete a forced password reset
//! - POST /auth/admin-reset - admin/master forces a reset on a user

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::auth::force_reset_service::{
    AdminResetOutcome, ForceResetService, ResetDenial, ResetOutcome,
};
use crate::auth::login_service::{LoginOutcome, LoginService};
use crate::profile::entity::Role;
use crate::shared::api_common::SuccessResponse;
use crate::shared::error::{ErrorResponse, PortalError};
use crate::shared::middleware::Authenticated;

/// Login request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub tenant_slug: String,
}

/// Login response
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub jwt: String,
    pub user: LoginUser,
    pub role: Role,
    /// Post-login landing path for the role
    pub redirect: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginUser {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
}

/// Force-reset error body: carries the user id so the caller can route to
/// the reset flow.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ForceResetRequiredResponse {
    pub success: bool,
    pub error_code: String,
    pub message: String,
    pub user_id: String,
}

/// Forced-reset completion request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompleteResetRequest {
    pub user_id: String,
    pub new_password: String,
}

/// Admin-triggered reset request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminResetRequest {
    pub user_id: String,
}

/// Admin-triggered reset response; the temporary password is shown once.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminResetResponse {
    pub success: bool,
    pub temp_password: String,
}

/// Auth API state
#[derive(Clone)]
pub struct AuthApiState {
    pub login_service: Arc<LoginService>,
    pub reset_service: Arc<ForceResetService>,
}

/// Login with email, password, and tenant slug
///
/// Every one of the six outcomes is mapped explicitly; none is ignorable.
#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    operation_id = "postAuthLogin",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Unknown tenant", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 403, description = "Wrong tenant or reset required", body = ErrorResponse),
        (status = 404, description = "No profile for identity", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AuthApiState>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, PortalError> {
    let outcome = state
        .login_service
        .attempt_login(&req.email, &req.password, &req.tenant_slug)
        .await?;

    let response = match outcome {
        LoginOutcome::Success { user_id, email, role, tenant_id, token } => {
            let body = LoginResponse {
                success: true,
                jwt: token,
                user: LoginUser { id: user_id, email, tenant_id },
                role,
                redirect: role.redirect_target().to_string(),
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        LoginOutcome::InvalidTenant => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("INVALID_TENANT", "Unknown tenant")),
        )
            .into_response(),
        LoginOutcome::AuthError { message, .. } => (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("AUTH_ERROR", message)),
        )
            .into_response(),
        LoginOutcome::ProfileNotFound { .. } => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("NO_PROFILE", "No profile for this account")),
        )
            .into_response(),
        LoginOutcome::WrongTenant => (
            StatusCode::FORBIDDEN,
            Json(ErrorResponse::new(
                "WRONG_TENANT",
                "Account does not belong to this tenant",
            )),
        )
            .into_response(),
        LoginOutcome::ForceResetRequired { user_id } => (
            StatusCode::FORBIDDEN,
            Json(ForceResetRequiredResponse {
                success: false,
                error_code: "FORCE_RESET".to_string(),
                message: "Password reset required before login".to_string(),
                user_id,
            }),
        )
            .into_response(),
    };

    Ok(response)
}

/// Complete a forced password reset
#[utoipa::path(
    post,
    path = "/force-reset",
    tag = "auth",
    operation_id = "postAuthForceReset",
    request_body = CompleteResetRequest,
    responses(
        (status = 200, description = "Reset completed", body = SuccessResponse),
        (status = 400, description = "Reset not required", body = ErrorResponse)
    )
)]
pub async fn complete_force_reset(
    State(state): State<AuthApiState>,
    Json(req): Json<CompleteResetRequest>,
) -> Result<Response, PortalError> {
    let outcome = state
        .reset_service
        .complete(&req.user_id, &req.new_password)
        .await?;

    let response = match outcome {
        ResetOutcome::Completed => {
            (StatusCode::OK, Json(SuccessResponse::ok())).into_response()
        }
        ResetOutcome::NotRequired => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                "RESET_NOT_REQUIRED",
                "No password reset is pending for this account",
            )),
        )
            .into_response(),
    };

    Ok(response)
}

/// Force a password reset on a user (admin/master only)
#[utoipa::path(
    post,
    path = "/admin-reset",
    tag = "auth",
    operation_id = "postAuthAdminReset",
    request_body = AdminResetRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Reset triggered", body = AdminResetResponse),
        (status = 400, description = "Unknown user", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not authorized", body = ErrorResponse)
    )
)]
pub async fn admin_reset(
    State(state): State<AuthApiState>,
    auth: Authenticated,
    Json(req): Json<AdminResetRequest>,
) -> Result<Response, PortalError> {
    let outcome = state
        .reset_service
        .admin_reset(&auth.sub, &req.user_id)
        .await?;

    let response = match outcome {
        AdminResetOutcome::Reset { temp_password } => (
            StatusCode::OK,
            Json(AdminResetResponse { success: true, temp_password }),
        )
            .into_response(),
        AdminResetOutcome::Denied(ResetDenial::Unauthorized) => (
            StatusCode::FORBIDDEN,
            Json(ErrorResponse::new(
                "FORBIDDEN",
                "Only admins and masters may trigger resets",
            )),
        )
            .into_response(),
        AdminResetOutcome::Denied(ResetDenial::CrossTenant) => (
            StatusCode::FORBIDDEN,
            Json(ErrorResponse::new(
                "CROSS_TENANT",
                "Cannot reset a user in another tenant",
            )),
        )
            .into_response(),
        AdminResetOutcome::NotFound => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("UNKNOWN_USER", "No such user")),
        )
            .into_response(),
    };

    Ok(response)
}

/// Create the auth router
pub fn auth_router(state: AuthApiState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(login))
        .routes(routes!(complete_force_reset))
        .routes(routes!(admin_reset))
        .with_state(state)
}
