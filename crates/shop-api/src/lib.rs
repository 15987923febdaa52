//! Storefront API - REST server
//!
//! Product catalogue with email/password accounts and a signed session
//! cookie. Reads are public; creating, editing and deleting products needs a
//! valid session.
//!
//! Author: hephaex@gmail.com

pub mod audit;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod media;
pub mod routes;
pub mod state;

use crate::auth::route_guard;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware, Router,
};
use shop_core::ServerConfig;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Room for the text fields and multipart framing around an image
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront API",
        description = "Product catalogue with cookie-based session authentication"
    ),
    paths(
        handlers::auth::register_handler,
        handlers::auth::login_handler,
        handlers::auth::logout_handler,
        handlers::products::list_products,
        handlers::products::get_product,
        handlers::products::create_product,
        handlers::products::update_product,
        handlers::products::delete_product,
        handlers::pages::add_product_page,
        handlers::pages::edit_product_page,
        handlers::pages::delete_product_page,
        handlers::health::health_check,
        handlers::health::readiness_check,
    ),
    components(schemas(
        shop_core::Product,
        shop_core::UserPublic,
        auth::RegisterRequest,
        auth::LoginRequest,
        error::ApiError,
        error::ResourceErrorBody,
        handlers::auth::MessageResponse,
        handlers::products::ProductForm,
        handlers::products::DeleteResponse,
        handlers::pages::PageResponse,
        handlers::health::HealthResponse,
        handlers::health::ReadinessResponse,
    )),
    tags(
        (name = "auth", description = "Registration, login and logout"),
        (name = "products", description = "Product catalogue"),
        (name = "pages", description = "Guarded page entry points"),
        (name = "health", description = "Liveness and readiness probes"),
    )
)]
pub struct ApiDoc;

/// Build the full application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .merge(routes::api_routes())
        .nest_service(
            state.media.public_prefix(),
            ServeDir::new(state.media.dir()),
        )
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn_with_state(state.clone(), route_guard))
        .layer(DefaultBodyLimit::max(
            state.media.max_bytes() + FORM_OVERHEAD_BYTES,
        ))
        .layer(TimeoutLayer::new(Duration::from_secs(
            state.config.server.request_timeout_secs,
        )));

    if let Some(cors) = cors_layer(&state.config.server) {
        router = router.layer(cors);
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

/// CORS for a separately hosted frontend; cookies require explicit origins
fn cors_layer(config: &ServerConfig) -> Option<CorsLayer> {
    if !config.cors_enabled {
        return None;
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE])
            .allow_credentials(true),
    )
}

/// Signing secret used by the test router
#[cfg(feature = "test-utils")]
pub const TEST_JWT_SECRET: &str = "integration-test-secret-do-not-use-in-prod";

/// In-memory state with a fixed secret and cheap Argon2 parameters
#[cfg(feature = "test-utils")]
pub fn create_test_state(upload_dir: impl Into<std::path::PathBuf>) -> Arc<AppState> {
    let mut config = shop_core::AppConfig::default();
    config.auth.jwt_secret = TEST_JWT_SECRET.to_string();
    config.uploads.dir = upload_dir.into();

    Arc::new(
        AppState::in_memory(config).with_password_config(auth::PasswordConfig {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
        }),
    )
}

/// Router over a fresh in-memory state, uploads under the system temp dir
#[cfg(feature = "test-utils")]
pub fn create_router_for_testing() -> Router {
    let upload_dir = std::env::temp_dir().join(format!("shop-api-test-{}", uuid::Uuid::new_v4()));
    create_router(create_test_state(upload_dir))
}
