//! Security audit logging for authentication and product events
//!
//! Every event is logged at INFO level with the "audit" target so it can be
//! routed separately from application logs. Events carry the full internal
//! reason (e.g. "expired" vs "bad signature") that clients never see.
//!
//! # Example
//!
//! ```ignore
//! use shop_api::audit::{audit_log, AuditEvent, RequestContext};
//!
//! audit_log(&AuditEvent::LoginSuccess {
//!     user_id: user.id,
//!     email: user.email.clone(),
//!     context: RequestContext::from_headers(&headers),
//! });
//! ```
//!
//! Author: hephaex@gmail.com

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// Client metadata attached to audit events
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Client IP address (from proxy headers)
    pub ip_address: Option<String>,
    /// User agent string
    pub user_agent: Option<String>,
}

impl RequestContext {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            ip_address: extract_ip_address(headers),
            user_agent: extract_user_agent(headers),
        }
    }
}

/// Product mutation kinds recorded in the audit trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductAction {
    Create,
    Update,
    Delete,
}

/// Security audit events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    /// Successful user login
    LoginSuccess {
        user_id: Uuid,
        email: String,
        #[serde(flatten)]
        context: RequestContext,
    },

    /// Failed login attempt
    LoginFailure {
        email: String,
        reason: String,
        #[serde(flatten)]
        context: RequestContext,
    },

    /// Successful user registration
    RegistrationSuccess {
        user_id: Uuid,
        email: String,
        #[serde(flatten)]
        context: RequestContext,
    },

    /// Failed registration attempt
    RegistrationFailure {
        email: Option<String>,
        reason: String,
        #[serde(flatten)]
        context: RequestContext,
    },

    /// Session cookie cleared
    Logout {
        had_session: bool,
        #[serde(flatten)]
        context: RequestContext,
    },

    /// Missing, malformed, forged or expired session on a protected resource
    InvalidSession {
        path: String,
        reason: String,
        #[serde(flatten)]
        context: RequestContext,
    },

    /// Anonymous request redirected away from a guarded page
    GuardRedirect {
        path: String,
        #[serde(flatten)]
        context: RequestContext,
    },

    /// Product created, updated or deleted
    ProductMutation {
        action: ProductAction,
        product_id: Uuid,
        user_id: Option<Uuid>,
        email: String,
    },
}

impl AuditEvent {
    fn summary(&self) -> &'static str {
        match self {
            Self::LoginSuccess { .. } => "Login successful",
            Self::LoginFailure { .. } => "Login failed",
            Self::RegistrationSuccess { .. } => "Registration successful",
            Self::RegistrationFailure { .. } => "Registration failed",
            Self::Logout { .. } => "User logout",
            Self::InvalidSession { .. } => "Invalid session",
            Self::GuardRedirect { .. } => "Guard redirect",
            Self::ProductMutation { .. } => "Product mutation",
        }
    }
}

/// Log a security audit event with structured fields
///
/// The event is serialized to JSON under the `event` field, e.g.
///
/// ```json
/// {"event_type":"login_failure","email":"a@example.com","reason":"password mismatch","ip_address":"203.0.113.1","user_agent":null}
/// ```
pub fn audit_log(event: &AuditEvent) {
    let event_json = serde_json::to_string(event)
        .unwrap_or_else(|e| format!("{{\"error\":\"Failed to serialize audit event: {e}\"}}"));

    info!(
        target: "audit",
        timestamp = %chrono::Utc::now(),
        event = %event_json,
        "{}",
        event.summary()
    );
}

/// Extract client IP address from request headers
///
/// Checks X-Forwarded-For (first hop) then X-Real-IP.
pub fn extract_ip_address(headers: &HeaderMap) -> Option<String> {
    if let Some(xff) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first_ip) = xff.split(',').next() {
            return Some(first_ip.trim().to_string());
        }
    }

    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Extract user agent from request headers
pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|ua| ua.to_str().ok())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_event_serialization() {
        let event = AuditEvent::LoginSuccess {
            user_id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            context: RequestContext {
                ip_address: Some("192.168.1.1".to_string()),
                user_agent: None,
            },
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_type"], "login_success");
        assert_eq!(json["email"], "test@example.com");
        assert_eq!(json["ip_address"], "192.168.1.1");
    }

    #[test]
    fn test_product_mutation_serialization() {
        let event = AuditEvent::ProductMutation {
            action: ProductAction::Delete,
            product_id: Uuid::nil(),
            user_id: None,
            email: "admin@example.com".to_string(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_type"], "product_mutation");
        assert_eq!(json["action"], "delete");
    }

    #[test]
    fn test_audit_log_does_not_panic() {
        audit_log(&AuditEvent::InvalidSession {
            path: "/products".to_string(),
            reason: "Token has expired".to_string(),
            context: RequestContext::default(),
        });
        audit_log(&AuditEvent::Logout {
            had_session: false,
            context: RequestContext::default(),
        });
    }

    #[test]
    fn test_extract_ip_from_x_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            "203.0.113.1, 198.51.100.1".parse().unwrap(),
        );

        assert_eq!(extract_ip_address(&headers), Some("203.0.113.1".to_string()));
    }

    #[test]
    fn test_extract_ip_from_x_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", "203.0.113.1".parse().unwrap());

        assert_eq!(extract_ip_address(&headers), Some("203.0.113.1".to_string()));
    }

    #[test]
    fn test_request_context_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::USER_AGENT,
            "Mozilla/5.0 (Test)".parse().unwrap(),
        );

        let context = RequestContext::from_headers(&headers);
        assert_eq!(context.user_agent.as_deref(), Some("Mozilla/5.0 (Test)"));
        assert_eq!(context.ip_address, None);
    }
}
