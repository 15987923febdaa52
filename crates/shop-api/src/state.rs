//! Application state management
//!
//! Author: hephaex@gmail.com

use crate::auth::cookie::CookieSettings;
use crate::auth::guard::GuardPolicy;
use crate::auth::password::PasswordConfig;
use crate::auth::token::TokenConfig;
use crate::media::MediaStore;
use shop_core::config::AppConfig;
use shop_core::{MemoryStore, ProductRepository, UserRepository};
use std::sync::Arc;
use std::time::Instant;

/// Application state shared across handlers
///
/// Everything here is fixed at startup; handlers only read it.
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Session token codec settings (secret, ttl, issuer)
    pub tokens: TokenConfig,
    /// Session cookie attributes
    pub cookies: CookieSettings,
    /// Argon2 cost parameters for new hashes
    pub passwords: PasswordConfig,
    /// Credential store
    pub users: Arc<dyn UserRepository>,
    /// Product store
    pub products: Arc<dyn ProductRepository>,
    /// Uploaded image storage
    pub media: MediaStore,
    /// Paths the route guard redirects anonymous visitors away from
    pub guard: GuardPolicy,
    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    /// Create application state over the given stores
    pub fn new(
        config: AppConfig,
        users: Arc<dyn UserRepository>,
        products: Arc<dyn ProductRepository>,
    ) -> Self {
        Self {
            tokens: TokenConfig::from(&config.auth),
            cookies: CookieSettings::from(&config.auth),
            passwords: PasswordConfig::default(),
            media: MediaStore::from(&config.uploads),
            guard: GuardPolicy::default(),
            users,
            products,
            config,
            start_time: Instant::now(),
        }
    }

    /// State backed by a single [`MemoryStore`] for users and products
    pub fn in_memory(config: AppConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::new(config, store.clone(), store)
    }

    /// Override the Argon2 cost parameters
    pub fn with_password_config(mut self, passwords: PasswordConfig) -> Self {
        self.passwords = passwords;
        self
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
