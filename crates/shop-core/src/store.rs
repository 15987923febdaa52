//! PostgreSQL store
//!
//! Provides user credentials and product persistence using SQLx and PostgreSQL.
//! Email uniqueness is enforced by the `users_email_key` unique index.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    NewUser, Product, ProductDraft, ProductRepository, Result, ShopError, User, UserRepository,
};

/// PostgreSQL store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new store connection
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| ShopError::StorageFailure(format!("PostgreSQL connection failed: {e}")))?;

        tracing::info!(max_connections, "Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Create from an existing pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the embedded schema migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| ShopError::StorageFailure(format!("Migration failed: {e}")))?;

        tracing::info!("Database migrations applied");
        Ok(())
    }
}

/// User row from database
#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    name: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

/// Product row from database
#[derive(Debug, FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    description: String,
    price: i64,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            image_url: row.image_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn storage(context: &str, err: sqlx::Error) -> ShopError {
    ShopError::StorageFailure(format!("{context}: {err}"))
}

#[async_trait]
impl UserRepository for PgStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, email, password_hash, name, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage("Failed to fetch user", e))?;

        Ok(row.map(User::from))
    }

    async fn create_user(&self, user: NewUser) -> Result<User> {
        let row: UserRow = sqlx::query_as(
            r#"
            INSERT INTO users (id, email, password_hash, name, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING id, email, password_hash, name, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => ShopError::DuplicateUser,
            other => storage("Failed to create user", other),
        })?;

        Ok(row.into())
    }
}

#[async_trait]
impl ProductRepository for PgStore {
    async fn list_products(&self) -> Result<Vec<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as(
            r#"
            SELECT id, name, description, price, image_url, created_at, updated_at
            FROM products
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage("Failed to list products", e))?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as(
            r#"
            SELECT id, name, description, price, image_url, created_at, updated_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage("Failed to get product", e))?;

        Ok(row.map(Product::from))
    }

    async fn create_product(&self, draft: ProductDraft) -> Result<Product> {
        draft.validate()?;
        let row: ProductRow = sqlx::query_as(
            r#"
            INSERT INTO products (id, name, description, price, image_url, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
            RETURNING id, name, description, price, image_url, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.price)
        .bind(&draft.image_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| storage("Failed to create product", e))?;

        Ok(row.into())
    }

    async fn update_product(&self, id: Uuid, draft: ProductDraft) -> Result<Product> {
        draft.validate()?;
        let row: Option<ProductRow> = sqlx::query_as(
            r#"
            UPDATE products SET
                name = $2,
                description = $3,
                price = $4,
                image_url = COALESCE($5, image_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, description, price, image_url, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.price)
        .bind(&draft.image_url)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage("Failed to update product", e))?;

        row.map(Product::from)
            .ok_or_else(|| ShopError::NotFound(format!("product {id}")))
    }

    async fn delete_product(&self, id: Uuid) -> Result<Product> {
        let row: Option<ProductRow> = sqlx::query_as(
            r#"
            DELETE FROM products
            WHERE id = $1
            RETURNING id, name, description, price, image_url, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage("Failed to delete product", e))?;

        row.map(Product::from)
            .ok_or_else(|| ShopError::NotFound(format!("product {id}")))
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| storage("Database ping failed", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_row_conversion() {
        let now = Utc::now();
        let row = ProductRow {
            id: Uuid::new_v4(),
            name: "Mug".to_string(),
            description: "Stoneware".to_string(),
            price: 12000,
            image_url: None,
            created_at: now,
            updated_at: now,
        };

        let product = Product::from(row);
        assert_eq!(product.name, "Mug");
        assert_eq!(product.price, 12000);
        assert!(product.image_url.is_none());
    }

    #[test]
    fn test_user_row_conversion() {
        let row = UserRow {
            id: Uuid::new_v4(),
            email: "bob@example.com".to_string(),
            password_hash: "hash".to_string(),
            name: None,
            created_at: Utc::now(),
        };

        let user = User::from(row);
        assert_eq!(user.email, "bob@example.com");
        assert_eq!(user.password_hash, "hash");
    }
}
