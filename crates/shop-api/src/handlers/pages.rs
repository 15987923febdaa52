//! Entry points for the add, edit and delete product pages
//!
//! These sit behind the route guard. They only describe the page and the
//! product it works on; the actual mutation goes through the product API.

use crate::error::ResourceError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use shop_core::{Product, ShopError};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PageResponse {
    /// Page identifier
    pub page: String,
    /// Product the page operates on, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<Product>,
}

async fn product_page(
    state: &AppState,
    page: &str,
    raw_id: &str,
) -> Result<Json<PageResponse>, ResourceError> {
    let product = match Uuid::parse_str(raw_id) {
        Ok(id) => state.products.get_product(id).await?,
        Err(_) => None,
    }
    .ok_or_else(|| ShopError::NotFound(format!("product {raw_id}")))?;

    Ok(Json(PageResponse {
        page: page.to_string(),
        product: Some(product),
    }))
}

#[utoipa::path(
    get,
    path = "/add-product",
    tag = "pages",
    responses(
        (status = 200, description = "Create page", body = PageResponse),
        (status = 303, description = "No session cookie, redirect to /login"),
    )
)]
pub async fn add_product_page() -> Json<PageResponse> {
    Json(PageResponse {
        page: "add-product".to_string(),
        product: None,
    })
}

#[utoipa::path(
    get,
    path = "/products/{id}/edit",
    tag = "pages",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Edit page", body = PageResponse),
        (status = 303, description = "No session cookie, redirect to /login"),
        (status = 404, description = "Product not found", body = crate::error::ResourceErrorBody),
    )
)]
pub async fn edit_product_page(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PageResponse>, ResourceError> {
    product_page(&state, "edit-product", &id).await
}

#[utoipa::path(
    get,
    path = "/products/{id}/delete",
    tag = "pages",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Delete confirmation page", body = PageResponse),
        (status = 303, description = "No session cookie, redirect to /login"),
        (status = 404, description = "Product not found", body = crate::error::ResourceErrorBody),
    )
)]
pub async fn delete_product_page(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PageResponse>, ResourceError> {
    product_page(&state, "delete-product", &id).await
}
