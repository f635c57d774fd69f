//! API Middleware
//!
//! Bearer-token authentication for Axum. The extractor only validates the
//! token and exposes its claims; services re-resolve the actor's profile for
//! authorization so role and tenant are always fresh.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::auth::token_service::{extract_bearer_token, SessionClaims, TokenService};
use crate::shared::error::ErrorResponse;

/// Shared service state injected into request extensions by `AuthLayer`.
#[derive(Clone)]
pub struct AppState {
    pub token_service: Arc<TokenService>,
}

/// Authenticated caller extractor: validates the JWT from the Authorization
/// header and exposes its claims.
pub struct Authenticated(pub SessionClaims);

impl std::ops::Deref for Authenticated {
    type Target = SessionClaims;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Error response for authentication failures
pub struct AuthRejection {
    pub status: StatusCode,
    pub message: String,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let body = ErrorResponse::new("UNAUTHORIZED", self.message);
        (self.status, Json(body)).into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let app_state = parts.extensions.get::<AppState>().ok_or_else(|| AuthRejection {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Auth service not configured".to_string(),
        })?;

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v: &HeaderValue| v.to_str().ok())
            .and_then(extract_bearer_token)
            .ok_or_else(|| AuthRejection {
                status: StatusCode::UNAUTHORIZED,
                message: "Missing authentication token".to_string(),
            })?;

        let claims = app_state.token_service.validate(token).map_err(|e| AuthRejection {
            status: StatusCode::UNAUTHORIZED,
            message: e.to_string(),
        })?;

        Ok(Authenticated(claims))
    }
}

/// Middleware layer that injects `AppState` into request extensions so the
/// `Authenticated` extractor can reach the token service.
use tower::{Layer, Service};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

#[derive(Clone)]
pub struct AuthLayer {
    state: AppState,
}

impl AuthLayer {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            state: self.state.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    state: AppState,
}

impl<S, B> Service<axum::http::Request<B>> for AuthMiddleware<S>
where
    S: Service<axum::http::Request<B>, Response = Response> + Send + Clone + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        req.extensions_mut().insert(self.state.clone());

        let future = self.inner.call(req);
        Box::pin(async move { future.await })
    }
}
