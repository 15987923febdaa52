//! Session check for state-changing handlers
//!
//! Every mutating handler calls [`require_session`] itself. Nothing is cached
//! between requests and the route guard having run grants nothing.

use super::cookie::session_token;
use super::token::{verify_token, SessionClaims};
use crate::audit::{audit_log, AuditEvent, RequestContext};
use crate::error::AppError;
use crate::state::AppState;
use axum::http::HeaderMap;

/// Verify the request's session cookie
///
/// Every failure (no cookie, bad signature, expired, malformed) collapses to
/// `Unauthorized`; the specific reason only goes to the audit log.
pub fn require_session(
    state: &AppState,
    headers: &HeaderMap,
    path: &str,
) -> Result<SessionClaims, AppError> {
    let reject = |reason: String| {
        audit_log(&AuditEvent::InvalidSession {
            path: path.to_string(),
            reason,
            context: RequestContext::from_headers(headers),
        });
        AppError::unauthorized()
    };

    let Some(token) = session_token(headers) else {
        return Err(reject("missing session cookie".to_string()));
    };

    verify_token(&state.tokens, token).map_err(|e| reject(e.to_string()))
}
