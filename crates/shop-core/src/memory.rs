//! In-memory store
//!
//! Backs tests and `--in-memory` development runs. Each mutation happens under
//! a single write lock, so the email check-and-insert is atomic.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    NewUser, Product, ProductDraft, ProductRepository, Result, ShopError, User, UserRepository,
};

/// In-memory users and products
#[derive(Default)]
pub struct MemoryStore {
    /// Users keyed by email
    users: RwLock<HashMap<String, User>>,
    products: RwLock<HashMap<Uuid, Product>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users
    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.users.read().await.get(email).cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.email) {
            return Err(ShopError::DuplicateUser);
        }

        let created = User {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            name: user.name,
            created_at: Utc::now(),
        };
        users.insert(created.email.clone(), created.clone());
        Ok(created)
    }
}

#[async_trait]
impl ProductRepository for MemoryStore {
    async fn list_products(&self) -> Result<Vec<Product>> {
        let mut products: Vec<Product> = self.products.read().await.values().cloned().collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(products)
    }

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn create_product(&self, draft: ProductDraft) -> Result<Product> {
        draft.validate()?;
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            name: draft.name,
            description: draft.description,
            price: draft.price,
            image_url: draft.image_url,
            created_at: now,
            updated_at: now,
        };
        self.products
            .write()
            .await
            .insert(product.id, product.clone());
        Ok(product)
    }

    async fn update_product(&self, id: Uuid, draft: ProductDraft) -> Result<Product> {
        draft.validate()?;
        let mut products = self.products.write().await;
        let product = products
            .get_mut(&id)
            .ok_or_else(|| ShopError::NotFound(format!("product {id}")))?;

        product.name = draft.name;
        product.description = draft.description;
        product.price = draft.price;
        if let Some(url) = draft.image_url {
            product.image_url = Some(url);
        }
        product.updated_at = Utc::now();

        Ok(product.clone())
    }

    async fn delete_product(&self, id: Uuid) -> Result<Product> {
        self.products
            .write()
            .await
            .remove(&id)
            .ok_or_else(|| ShopError::NotFound(format!("product {id}")))
    }
}
