//! Authentication API handlers
//!
//! Register, login and logout. The session token is only ever sent back in
//! the `token` cookie, never in a response body.
//!
//! Author: hephaex@gmail.com

use crate::audit::{audit_log, AuditEvent, RequestContext};
use crate::auth::{
    clear_session_cookie, session_cookie, session_token, AuthService, LoginRequest,
    RegisterRequest,
};
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect},
    Json,
};
use serde::{Deserialize, Serialize};
use shop_core::UserPublic;
use std::sync::Arc;
use utoipa::ToSchema;

/// Plain acknowledgement body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Unwrap a JSON body, turning any rejection into a 400 with a fixed message
///
/// The deserializer's own text stays in the debug log.
fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            tracing::debug!(error = %rejection.body_text(), "Rejected auth request body");
            let message = match rejection {
                JsonRejection::MissingJsonContentType(_) => "Expected a JSON request body",
                _ => "Invalid JSON request body",
            };
            Err(AppError::validation(message))
        }
    }
}

/// Register a new user account
///
/// # Responses
///
/// * `201 Created` - User registered; body is the user without the password hash
/// * `400 Bad Request` - Missing fields or email already registered
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = UserPublic),
        (status = 400, description = "Malformed body, missing fields or user already exists", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError),
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let request = json_body(body)?;
    let email = request.email.clone();

    match AuthService::from_state(&state).register(request).await {
        Ok(user) => {
            audit_log(&AuditEvent::RegistrationSuccess {
                user_id: user.id,
                email: user.email.clone(),
                context: RequestContext::from_headers(&headers),
            });
            Ok((StatusCode::CREATED, Json(user)))
        }
        Err(e) => {
            audit_log(&AuditEvent::RegistrationFailure {
                email,
                reason: e.to_string(),
                context: RequestContext::from_headers(&headers),
            });
            Err(e.into())
        }
    }
}

/// Login with email and password
///
/// On success the session token is set as an `HttpOnly` cookie.
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful, session cookie set", body = MessageResponse),
        (status = 400, description = "Malformed body or missing fields", body = crate::error::ApiError),
        (status = 401, description = "Invalid credentials", body = crate::error::ApiError),
        (status = 404, description = "User not found", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError),
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let request = json_body(body)?;
    let email = request.email.clone().unwrap_or_default();

    let outcome = match AuthService::from_state(&state).login(request).await {
        Ok(outcome) => outcome,
        Err(e) => {
            audit_log(&AuditEvent::LoginFailure {
                email,
                reason: e.to_string(),
                context: RequestContext::from_headers(&headers),
            });
            return Err(e.into());
        }
    };

    let cookie = session_cookie(&outcome.token, &state.cookies)
        .map_err(|e| anyhow::anyhow!("Failed to build session cookie: {e}"))?;

    audit_log(&AuditEvent::LoginSuccess {
        user_id: outcome.user.id,
        email: outcome.user.email.clone(),
        context: RequestContext::from_headers(&headers),
    });

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(MessageResponse {
            message: "Login successful".to_string(),
        }),
    ))
}

/// Clear the session cookie and go home
///
/// Always succeeds, whatever state the current cookie is in.
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    responses(
        (status = 303, description = "Session cookie cleared, redirect to /"),
    )
)]
pub async fn logout_handler(headers: HeaderMap) -> impl IntoResponse {
    audit_log(&AuditEvent::Logout {
        had_session: session_token(&headers).is_some(),
        context: RequestContext::from_headers(&headers),
    });

    ([(header::SET_COOKIE, clear_session_cookie())], Redirect::to("/"))
}
