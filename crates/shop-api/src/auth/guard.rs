//! Route guard middleware
//!
//! A cheap pre-handler gate: requests for protected pages that carry no
//! `token` cookie are redirected to `/login`. Only cookie *presence* is
//! checked here; a forged or expired value passes through and is rejected by
//! the handler's own session check.

use super::cookie::session_token;
use crate::audit::{audit_log, AuditEvent, RequestContext};
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;

/// Where anonymous visitors are sent
pub const LOGIN_PATH: &str = "/login";

/// A protected-path pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardPattern {
    /// Path equals the prefix or continues it with a `/`
    Prefix(String),
    /// Any `/`-separated path segment equals the value
    Segment(String),
}

impl GuardPattern {
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Prefix(prefix) => path
                .strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/')),
            Self::Segment(segment) => path.split('/').any(|s| s == segment),
        }
    }
}

/// Set of protected-path patterns
#[derive(Debug, Clone)]
pub struct GuardPolicy {
    patterns: Vec<GuardPattern>,
}

impl GuardPolicy {
    pub fn new(patterns: Vec<GuardPattern>) -> Self {
        Self { patterns }
    }

    pub fn is_protected(&self, path: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(path))
    }
}

impl Default for GuardPolicy {
    /// The create page plus anything with an `edit` or `delete` segment
    fn default() -> Self {
        Self::new(vec![
            GuardPattern::Prefix("/add-product".to_string()),
            GuardPattern::Segment("edit".to_string()),
            GuardPattern::Segment("delete".to_string()),
        ])
    }
}

/// Redirect cookie-less requests for protected paths to the login page
pub async fn route_guard(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();

    if state.guard.is_protected(path) && session_token(request.headers()).is_none() {
        audit_log(&AuditEvent::GuardRedirect {
            path: path.to_string(),
            context: RequestContext::from_headers(request.headers()),
        });
        return Redirect::to(LOGIN_PATH).into_response();
    }

    next.run(request).await
}
