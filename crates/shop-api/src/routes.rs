//! API route definitions
//!
//! Author: hephaex@gmail.com

use crate::handlers::{auth, health, pages, products};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Create the storefront routes
///
/// Session checks live in the product handlers themselves; the route guard
/// is applied on top of everything in [`crate::create_router`].
pub fn api_routes() -> Router<Arc<AppState>> {
    let auth_routes = Router::new()
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler));

    let product_routes = Router::new()
        .route(
            "/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/products/:id",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        );

    // Guarded page entry points
    let page_routes = Router::new()
        .route("/add-product", get(pages::add_product_page))
        .route("/products/:id/edit", get(pages::edit_product_page))
        .route("/products/:id/delete", get(pages::delete_product_page));

    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check));

    Router::new()
        .merge(auth_routes)
        .merge(product_routes)
        .merge(page_routes)
        .merge(health_routes)
}
