//! Product API handlers
//!
//! Reads are public. Create, update and delete re-verify the session cookie
//! on every call before touching anything. Errors use the `{ "error": ... }`
//! body.
//!
//! Author: hephaex@gmail.com

use crate::audit::{audit_log, AuditEvent, ProductAction};
use crate::auth::{require_session, SessionClaims};
use crate::auth::service::first_message;
use crate::error::{AppError, ResourceError};
use crate::media::StoredMedia;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::{HeaderMap, Uri},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use shop_core::{Product, ProductDraft, ShopError, MIN_PRICE};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Product fields submitted as `multipart/form-data`
///
/// An optional `file` part carries the product image.
#[derive(Debug, Clone, Default, Deserialize, ToSchema, Validate)]
pub struct ProductForm {
    #[validate(length(min = 1, max = 200, message = "Product name must be 1-200 characters"))]
    pub name: String,
    #[validate(length(max = 5000, message = "Description is too long"))]
    pub description: String,
    #[validate(range(min = 1000, message = "Price must be at least 1000"))]
    pub price: i64,
}

impl ProductForm {
    fn into_draft(self, image_url: Option<String>) -> ProductDraft {
        ProductDraft {
            name: self.name,
            description: self.description,
            price: self.price,
            image_url,
        }
    }
}

/// Uploaded file part, before it is stored
struct ImageUpload {
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Bytes,
}

/// Delete acknowledgement
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteResponse {
    pub success: bool,
}

/// Collect and validate the form fields and optional image of a product request
///
/// Nothing is written until the whole form has been read and validated.
async fn read_product_form(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(ProductForm, Option<ImageUpload>), AppError> {
    let mut multipart =
        multipart.map_err(|e| AppError::validation(format!("Expected multipart form data: {e}")))?;

    let mut name = None;
    let mut description = None;
    let mut price = None;
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Invalid multipart body: {e}")))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "file" => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::validation(format!("Failed to read file: {e}")))?;
                // Browsers send an empty part when no file was chosen
                if !bytes.is_empty() {
                    image = Some(ImageUpload {
                        file_name,
                        content_type,
                        bytes,
                    });
                }
            }
            "name" | "description" | "price" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::validation(format!("Invalid field {field_name}: {e}")))?;
                match field_name.as_str() {
                    "name" => name = Some(value),
                    "description" => description = Some(value),
                    _ => price = Some(value),
                }
            }
            other => tracing::debug!(field = %other, "Ignoring unknown form field"),
        }
    }

    let name = name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ShopError::MissingFields("name".to_string()))?;
    let price = price
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ShopError::MissingFields("price".to_string()))?;
    let price = price.parse::<i64>().map_err(|_| {
        AppError::validation(format!(
            "Price must be a whole number of at least {MIN_PRICE}"
        ))
    })?;

    let form = ProductForm {
        name,
        description: description.unwrap_or_default(),
        price,
    };
    form.validate()
        .map_err(|e| AppError::validation(first_message(&e)))?;

    Ok((form, image))
}

async fn store_image(state: &AppState, image: Option<ImageUpload>) -> Result<Option<StoredMedia>, AppError> {
    match image {
        Some(upload) => Ok(Some(
            state
                .media
                .save(
                    upload.file_name.as_deref(),
                    upload.content_type.as_deref(),
                    &upload.bytes,
                )
                .await?,
        )),
        None => Ok(None),
    }
}

/// A malformed id cannot name any product
fn parse_id(raw: &str) -> Result<Uuid, ShopError> {
    Uuid::parse_str(raw).map_err(|_| ShopError::NotFound(format!("product {raw}")))
}

fn audit_mutation(action: ProductAction, product_id: Uuid, session: &SessionClaims) {
    audit_log(&AuditEvent::ProductMutation {
        action,
        product_id,
        user_id: session.user_id(),
        email: session.email.clone(),
    });
}

/// List all products, newest first
#[utoipa::path(
    get,
    path = "/products",
    tag = "products",
    responses(
        (status = 200, description = "All products", body = Vec<Product>),
        (status = 500, description = "Internal server error", body = crate::error::ResourceErrorBody),
    )
)]
pub async fn list_products(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Product>>, ResourceError> {
    Ok(Json(state.products.list_products().await?))
}

/// Get a single product
#[utoipa::path(
    get,
    path = "/products/{id}",
    tag = "products",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product found", body = Product),
        (status = 404, description = "Product not found", body = crate::error::ResourceErrorBody),
    )
)]
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ResourceError> {
    let id = parse_id(&id)?;
    let product = state
        .products
        .get_product(id)
        .await?
        .ok_or_else(|| ShopError::NotFound(format!("product {id}")))?;

    Ok(Json(product))
}

/// Create a product
///
/// Requires a valid session cookie. The image, if any, is stored before the
/// product record and removed again if the record cannot be written.
#[utoipa::path(
    post,
    path = "/products",
    tag = "products",
    request_body(content = ProductForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Product created", body = Product),
        (status = 400, description = "Invalid input", body = crate::error::ResourceErrorBody),
        (status = 401, description = "Missing or invalid session", body = crate::error::ResourceErrorBody),
        (status = 500, description = "Internal server error", body = crate::error::ResourceErrorBody),
    )
)]
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    uri: Uri,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Product>, ResourceError> {
    let session = require_session(&state, &headers, uri.path())?;
    let (form, image) = read_product_form(multipart).await?;

    let stored = store_image(&state, image).await?;
    let draft = form.into_draft(stored.as_ref().map(|m| m.url.clone()));

    let product = match state.products.create_product(draft).await {
        Ok(product) => product,
        Err(e) => {
            if let Some(media) = &stored {
                state.media.discard_url(&media.url).await;
            }
            return Err(e.into());
        }
    };

    audit_mutation(ProductAction::Create, product.id, &session);
    Ok(Json(product))
}

/// Update a product
///
/// Replaces name, description and price. A new `file` replaces the image;
/// without one the current image is kept.
#[utoipa::path(
    put,
    path = "/products/{id}",
    tag = "products",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body(content = ProductForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Product updated", body = Product),
        (status = 400, description = "Invalid input", body = crate::error::ResourceErrorBody),
        (status = 401, description = "Missing or invalid session", body = crate::error::ResourceErrorBody),
        (status = 404, description = "Product not found", body = crate::error::ResourceErrorBody),
        (status = 500, description = "Internal server error", body = crate::error::ResourceErrorBody),
    )
)]
pub async fn update_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    uri: Uri,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Product>, ResourceError> {
    let session = require_session(&state, &headers, uri.path())?;
    let id = parse_id(&id)?;
    let (form, image) = read_product_form(multipart).await?;

    let previous_image = state
        .products
        .get_product(id)
        .await?
        .ok_or_else(|| ShopError::NotFound(format!("product {id}")))?
        .image_url;

    let stored = store_image(&state, image).await?;
    let draft = form.into_draft(stored.as_ref().map(|m| m.url.clone()));

    let product = match state.products.update_product(id, draft).await {
        Ok(product) => product,
        Err(e) => {
            if let Some(media) = &stored {
                state.media.discard_url(&media.url).await;
            }
            return Err(e.into());
        }
    };

    // The old image is only dropped once the record points at the new one
    if let (Some(_), Some(old)) = (&stored, &previous_image) {
        state.media.discard_url(old).await;
    }

    audit_mutation(ProductAction::Update, product.id, &session);
    Ok(Json(product))
}

/// Delete a product and its stored image
#[utoipa::path(
    delete,
    path = "/products/{id}",
    tag = "products",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product deleted", body = DeleteResponse),
        (status = 401, description = "Missing or invalid session", body = crate::error::ResourceErrorBody),
        (status = 404, description = "Product not found", body = crate::error::ResourceErrorBody),
        (status = 500, description = "Internal server error", body = crate::error::ResourceErrorBody),
    )
)]
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ResourceError> {
    let session = require_session(&state, &headers, uri.path())?;
    let id = parse_id(&id)?;

    let product = state.products.delete_product(id).await?;
    if let Some(url) = &product.image_url {
        state.media.discard_url(url).await;
    }

    audit_mutation(ProductAction::Delete, product.id, &session);
    Ok(Json(DeleteResponse { success: true }))
}
