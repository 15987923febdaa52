//! Shop Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout the storefront:
//! - User and product models
//! - Common error types
//! - Store traits for credentials and products
//! - Configuration management
//! - PostgreSQL and in-memory store implementations

pub mod config;
pub mod memory;
pub mod store;

pub use config::{AppConfig, AuthConfig, ConfigError, DatabaseConfig, ServerConfig, UploadConfig};
pub use memory::MemoryStore;
pub use store::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for storefront operations
///
/// This is the full internal taxonomy. The HTTP layer collapses it into
/// client-visible messages; logs keep the detail.
#[derive(Error, Debug)]
pub enum ShopError {
    #[error("Missing fields: {0}")]
    MissingFields(String),

    #[error("User already exists")]
    DuplicateUser,

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Storage failure: {0}")]
    StorageFailure(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ShopError>;

// ============================================================================
// Users
// ============================================================================

/// Stored user account, including the password hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Projection that is safe to return to clients
    pub fn to_public(&self) -> UserPublic {
        UserPublic {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            created_at: self.created_at,
        }
    }
}

/// Public user representation (no credential material)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct UserPublic {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a user; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: Option<String>,
}

// ============================================================================
// Products
// ============================================================================

/// Smallest accepted product price, in the smallest currency unit
pub const MIN_PRICE: i64 = 1000;

/// Product listed in the storefront
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    #[schema(example = "Ceramic mug")]
    pub name: String,
    pub description: String,
    /// Price in the smallest currency unit
    #[schema(example = 25000)]
    pub price: i64,
    /// Public URL of the product image, if one was uploaded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated field set for creating or replacing a product
///
/// On update, `image_url: None` keeps the image already on record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub price: i64,
    pub image_url: Option<String>,
}

impl ProductDraft {
    /// Check boundary invariants before anything is written
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ShopError::ValidationError(
                "Product name cannot be empty".to_string(),
            ));
        }
        if self.price < MIN_PRICE {
            return Err(ShopError::ValidationError(format!(
                "Price must be at least {MIN_PRICE}"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Store Traits
// ============================================================================

/// Credential store
///
/// Implementations must guarantee email uniqueness themselves: of two
/// concurrent `create_user` calls with the same email exactly one succeeds and
/// the other returns [`ShopError::DuplicateUser`].
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Look a user up by email
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Create a user
    async fn create_user(&self, user: NewUser) -> Result<User>;
}

/// Product store
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// All products, newest first
    async fn list_products(&self) -> Result<Vec<Product>>;

    /// Get product by ID
    async fn get_product(&self, id: Uuid) -> Result<Option<Product>>;

    /// Insert a product
    async fn create_product(&self, draft: ProductDraft) -> Result<Product>;

    /// Replace name, description and price; `NotFound` if the ID is unknown
    async fn update_product(&self, id: Uuid, draft: ProductDraft) -> Result<Product>;

    /// Delete and return the removed product; `NotFound` if the ID is unknown
    async fn delete_product(&self, id: Uuid) -> Result<Product>;

    /// Cheap connectivity probe for readiness checks
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(price: i64) -> ProductDraft {
        ProductDraft {
            name: "Tea".to_string(),
            description: "Green tea".to_string(),
            price,
            image_url: None,
        }
    }

    #[test]
    fn test_price_boundary() {
        let err = draft(999).validate().unwrap_err();
        assert!(matches!(err, ShopError::ValidationError(ref m) if m.contains("1000")));
        assert!(draft(1000).validate().is_ok());
    }

    #[test]
    fn test_blank_name_rejected() {
        let mut d = draft(5000);
        d.name = "   ".to_string();
        assert!(matches!(d.validate(), Err(ShopError::ValidationError(_))));
    }

    #[test]
    fn test_user_public_has_no_hash() {
        let user = User {
            id: Uuid::new_v4(),
            email: "alice@example.com".to_string(),
            password_hash: "$argon2id$v=19$secret".to_string(),
            name: Some("Alice".to_string()),
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&user.to_public()).unwrap();
        assert!(json.contains("alice@example.com"));
        assert!(!json.contains("argon2"));
        assert!(!json.contains("password"));
    }

    #[test]
    fn test_product_serializes_camel_case() {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            name: "Mug".to_string(),
            description: "Blue".to_string(),
            price: 25000,
            image_url: Some("/uploads/a.png".to_string()),
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["imageUrl"], "/uploads/a.png");
        assert_eq!(json["price"], 25000);
    }
}
