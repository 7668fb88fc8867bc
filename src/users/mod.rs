//! Account storage: the one external collaborator the authentication
//! subsystem drives directly. `UserStore` is the contract; `PgUserStore`
//! backs production and `MemoryUserStore` backs tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::auth::responses::Role;

pub mod memory;
pub mod store;

pub use memory::MemoryUserStore;
pub use store::PgUserStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("username is already taken")]
    DuplicateUsername,
    #[error("email is already registered")]
    DuplicateEmail,
    #[error("database error: {0}")]
    Database(String),
}

/// A stored account. The password digest never leaves this module except
/// through the service layer's verification path.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub roles: Vec<Role>,
    pub created_at: DateTime<Utc>,
}

/// Record shape for `save`: an upsert keyed by username. Registration
/// inserts; password and role updates rewrite the existing row.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub roles: Vec<Role>,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn exists_by_username(&self, username: &str) -> Result<bool, StoreError>;
    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError>;
    async fn save(&self, user: NewUser) -> Result<User, StoreError>;
}
