use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::auth::responses::Role;
use crate::users::{NewUser, StoreError, User, UserStore};

const USER_COLUMNS: &str = "id, username, email, password_hash, roles, created_at";

/// Postgres-backed account store. `save` is an upsert keyed by username so
/// registration, password changes, and role updates all go through it.
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
        let roles: Vec<String> = row.try_get("roles")?;
        let roles = roles
            .iter()
            .map(|wire| {
                Role::from_wire(wire).unwrap_or_else(|| {
                    log::warn!("unknown role '{}' in users table, treating as ROLE_USER", wire);
                    Role::User
                })
            })
            .collect();
        let created_at: DateTime<Utc> = row.try_get("created_at")?;

        Ok(User {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            roles,
            created_at,
        })
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.as_ref()
            .map(Self::user_from_row)
            .transpose()
            .map_err(db_error)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.as_ref()
            .map(Self::user_from_row)
            .transpose()
            .map_err(db_error)
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, StoreError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await
                .map_err(db_error)?;
        Ok(exists)
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE lower(email) = lower($1))",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(exists)
    }

    async fn save(&self, user: NewUser) -> Result<User, StoreError> {
        let roles: Vec<String> = user
            .roles
            .iter()
            .map(|role| role.as_wire().to_string())
            .collect();

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (username, email, password_hash, roles)
            VALUES ($1, lower($2), $3, $4)
            ON CONFLICT (username) DO UPDATE
            SET email = EXCLUDED.email,
                password_hash = EXCLUDED.password_hash,
                roles = EXCLUDED.roles
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&roles)
        .fetch_one(&self.pool)
        .await
        .map_err(save_error)?;

        Self::user_from_row(&row).map_err(db_error)
    }
}

fn db_error(err: sqlx::Error) -> StoreError {
    StoreError::Database(err.to_string())
}

fn save_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") {
            let constraint = db_err.constraint().unwrap_or_default();
            if constraint.contains("email") {
                return StoreError::DuplicateEmail;
            }
            return StoreError::DuplicateUsername;
        }
    }
    db_error(err)
}
