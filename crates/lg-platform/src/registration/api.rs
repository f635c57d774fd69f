//! Registration API Endpoints
//!
//! - POST /registrations - public intake of a registration request
//! - POST /registrations/approve - admin/master approval (creates the account)
//! - POST /internal/cleanup - manual sweep of expired pending registrations

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::profile::entity::Role;
use crate::registration::service::{
    ApprovalDenial, ApprovalOutcome, IntakeOutcome, RegistrationService, SubmitRegistration,
};
use crate::shared::api_common::SuccessResponse;
use crate::shared::error::{ErrorResponse, PortalError};
use crate::shared::middleware::Authenticated;

/// Registration intake request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub tenant_slug: String,
    #[serde(default)]
    pub user_type: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Approval request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApproveRequest {
    pub pending_id: String,
    pub assign_role: Role,
}

/// Approval response: the account that now exists
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApproveResponse {
    pub success: bool,
    pub user: ApprovedUser,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApprovedUser {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub tenant_id: String,
}

/// Registration API state
#[derive(Clone)]
pub struct RegistrationApiState {
    pub registration_service: Arc<RegistrationService>,
}

/// Submit a registration request
///
/// Queues the request for admin review; no account is created here.
#[utoipa::path(
    post,
    path = "/",
    tag = "registrations",
    operation_id = "postRegistration",
    request_body = RegisterRequest,
    responses(
        (status = 202, description = "Registration queued for review", body = SuccessResponse),
        (status = 400, description = "Invalid submission", body = ErrorResponse),
        (status = 429, description = "Too many attempts", body = ErrorResponse)
    )
)]
pub async fn submit_registration(
    State(state): State<RegistrationApiState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Response, PortalError> {
    let outcome = state
        .registration_service
        .submit(SubmitRegistration {
            email: req.email,
            password: req.password,
            full_name: req.full_name,
            tenant_slug: req.tenant_slug,
            user_type: req.user_type,
            metadata: req.metadata,
        })
        .await?;

    let response = match outcome {
        // The pending id stays internal: admins look pending records up on
        // their side, and the submitter gets no handle to poll or enumerate.
        IntakeOutcome::Accepted { pending_id } => {
            tracing::debug!(pending_id = %pending_id, "registration queued");
            (
                StatusCode::ACCEPTED,
                Json(SuccessResponse::with_message("Registration submitted for review")),
            )
                .into_response()
        }
        IntakeOutcome::Invalid { message } => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("INVALID_REQUEST", message)),
        )
            .into_response(),
        IntakeOutcome::RateLimited => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorResponse::new(
                "RATE_LIMITED",
                "Too many registration attempts; try again later",
            )),
        )
            .into_response(),
    };

    Ok(response)
}

/// Approve a pending registration (admin/master only)
#[utoipa::path(
    post,
    path = "/approve",
    tag = "registrations",
    operation_id = "postRegistrationApprove",
    request_body = ApproveRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Account created", body = ApproveResponse),
        (status = 400, description = "Approval failed", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
pub async fn approve_registration(
    State(state): State<RegistrationApiState>,
    auth: Authenticated,
    Json(req): Json<ApproveRequest>,
) -> Result<Response, PortalError> {
    let outcome = state
        .registration_service
        .approve(&auth.sub, &req.pending_id, req.assign_role)
        .await?;

    let response = match outcome {
        ApprovalOutcome::Approved { user_id, email, role, tenant_id } => (
            StatusCode::CREATED,
            Json(ApproveResponse {
                success: true,
                user: ApprovedUser { id: user_id, email, role, tenant_id },
            }),
        )
            .into_response(),
        ApprovalOutcome::Denied(ApprovalDenial::Unauthorized) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                "UNAUTHORIZED",
                "Only admins and masters may approve registrations",
            )),
        )
            .into_response(),
        ApprovalOutcome::Denied(ApprovalDenial::CrossTenant) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                "CROSS_TENANT",
                "Cannot approve a registration for another tenant",
            )),
        )
            .into_response(),
        ApprovalOutcome::NotFound => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                "NOT_FOUND",
                "Pending registration not found",
            )),
        )
            .into_response(),
        ApprovalOutcome::TenantMissing { slug } => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                "TENANT_MISSING",
                format!("Tenant '{}' no longer exists", slug),
            )),
        )
            .into_response(),
    };

    Ok(response)
}

/// Sweep expired pending registrations now
#[utoipa::path(
    post,
    path = "/cleanup",
    tag = "internal",
    operation_id = "postInternalCleanup",
    responses(
        (status = 200, description = "Sweep completed", body = SuccessResponse)
    )
)]
pub async fn cleanup_expired(
    State(state): State<RegistrationApiState>,
) -> Result<Response, PortalError> {
    let deleted = state.registration_service.sweep(Utc::now()).await?;
    let body = SuccessResponse::with_message(format!(
        "Removed {} expired pending registration(s)",
        deleted
    ));
    Ok((StatusCode::OK, Json(body)).into_response())
}

/// Create the registration router
pub fn registration_router(state: RegistrationApiState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(submit_registration))
        .routes(routes!(approve_registration))
        .with_state(state)
}

/// Create the internal maintenance router
pub fn maintenance_router(state: RegistrationApiState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(cleanup_expired))
        .with_state(state)
}
