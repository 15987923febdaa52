//! Authentication and session handling
//!
//! - `token`: HS256 session tokens (issue / verify)
//! - `password`: Argon2id hashing
//! - `cookie`: the `token` session cookie
//! - `guard`: presence-only route guard middleware
//! - `session`: signature and expiry check used by mutating handlers
//! - `service`: registration and login

pub mod cookie;
pub mod guard;
pub mod password;
pub mod service;
pub mod session;
pub mod token;

pub use cookie::{clear_session_cookie, session_cookie, session_token, CookieSettings, SESSION_COOKIE};
pub use guard::{route_guard, GuardPattern, GuardPolicy, LOGIN_PATH};
pub use password::{hash_password, verify_password, PasswordConfig, PasswordError};
pub use service::{AuthService, LoginOutcome, LoginRequest, RegisterRequest};
pub use session::require_session;
pub use token::{issue_token, verify_token, SessionClaims, TokenConfig, TokenError};
