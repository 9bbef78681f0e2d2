use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::User;

/// Fields for a new account. The password must already be hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub location: Option<String>,
    pub is_admin: bool,
}

/// Partial update; `None` leaves the column untouched
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub location: Option<String>,
    pub is_admin: Option<bool>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.password_hash.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.location.is_none()
            && self.is_admin.is_none()
    }
}

pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub async fn new() -> Result<Self, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    pub async fn create(&self, user: NewUser) -> Result<User, DatabaseError> {
        DatabaseManager::run(
            sqlx::query_as::<_, User>(
                r#"
                INSERT INTO users (id, username, password_hash, first_name, last_name, location, is_admin)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.location)
            .bind(user.is_admin)
            .fetch_one(&self.pool),
        )
        .await
    }

    pub async fn list(&self) -> Result<Vec<User>, DatabaseError> {
        DatabaseManager::run(
            sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY username").fetch_all(&self.pool),
        )
        .await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        DatabaseManager::run(
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        DatabaseManager::run(
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
                .bind(username)
                .fetch_optional(&self.pool),
        )
        .await
    }

    /// Resolve a bearer token: the user must exist and still hold the token
    pub async fn find_by_token(&self, id: Uuid, token_digest: &str) -> Result<Option<User>, DatabaseError> {
        DatabaseManager::run(
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 AND $2 = ANY(tokens)")
                .bind(id)
                .bind(token_digest)
                .fetch_optional(&self.pool),
        )
        .await
    }

    /// Remember a freshly issued token (keeping only the newest `keep`)
    /// and stamp the login time
    pub async fn record_login(&self, id: Uuid, token_digest: &str, keep: u32) -> Result<User, DatabaseError> {
        let keep = i32::try_from(keep.max(1)).unwrap_or(i32::MAX);
        DatabaseManager::run(
            sqlx::query_as::<_, User>(
                r#"
                UPDATE users
                SET tokens = (array_append(tokens, $2))[GREATEST(cardinality(tokens) + 2 - $3, 1):],
                    last_login = NOW(),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
                "#,
            )
            .bind(id)
            .bind(token_digest)
            .bind(keep)
            .fetch_one(&self.pool),
        )
        .await
    }

    pub async fn revoke_token(&self, id: Uuid, token_digest: &str) -> Result<(), DatabaseError> {
        DatabaseManager::run(
            sqlx::query("UPDATE users SET tokens = array_remove(tokens, $2), updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(token_digest)
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    pub async fn revoke_all_tokens(&self, id: Uuid) -> Result<(), DatabaseError> {
        DatabaseManager::run(
            sqlx::query("UPDATE users SET tokens = '{}', updated_at = NOW() WHERE id = $1")
                .bind(id)
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    pub async fn update(&self, id: Uuid, changes: UserChanges) -> Result<User, DatabaseError> {
        DatabaseManager::run(
            sqlx::query_as::<_, User>(
                r#"
                UPDATE users
                SET username = COALESCE($2, username),
                    password_hash = COALESCE($3, password_hash),
                    first_name = COALESCE($4, first_name),
                    last_name = COALESCE($5, last_name),
                    location = COALESCE($6, location),
                    is_admin = COALESCE($7, is_admin),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
                "#,
            )
            .bind(id)
            .bind(&changes.username)
            .bind(&changes.password_hash)
            .bind(&changes.first_name)
            .bind(&changes.last_name)
            .bind(&changes.location)
            .bind(changes.is_admin)
            .fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("User {} not found", id)))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), DatabaseError> {
        let result = DatabaseManager::run(sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(&self.pool))
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("User {} not found", id)));
        }
        Ok(())
    }

    /// Store a reset token digest. Returns false when the username is unknown.
    pub async fn set_reset_token(
        &self,
        username: &str,
        token_digest: &str,
        expires: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        let result = DatabaseManager::run(
            sqlx::query(
                r#"
                UPDATE users
                SET reset_password_token = $2, reset_password_expires = $3, updated_at = NOW()
                WHERE username = $1
                "#,
            )
            .bind(username)
            .bind(token_digest)
            .bind(expires)
            .execute(&self.pool),
        )
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Consume an unexpired reset token, replacing the password and revoking
    /// every issued bearer token. Returns `None` for unknown or expired tokens.
    pub async fn reset_password(&self, token_digest: &str, password_hash: &str) -> Result<Option<User>, DatabaseError> {
        DatabaseManager::run(
            sqlx::query_as::<_, User>(
                r#"
                UPDATE users
                SET password_hash = $2,
                    reset_password_token = NULL,
                    reset_password_expires = NULL,
                    tokens = '{}',
                    updated_at = NOW()
                WHERE reset_password_token = $1
                  AND reset_password_expires > NOW()
                RETURNING *
                "#,
            )
            .bind(token_digest)
            .bind(password_hash)
            .fetch_optional(&self.pool),
        )
        .await
    }

    /// Create the account if missing and make sure it carries the admin flag.
    /// An existing account keeps its password.
    pub async fn ensure_admin(&self, user: NewUser) -> Result<User, DatabaseError> {
        DatabaseManager::run(
            sqlx::query_as::<_, User>(
                r#"
                INSERT INTO users (id, username, password_hash, first_name, last_name, location, is_admin)
                VALUES ($1, $2, $3, $4, $5, $6, TRUE)
                ON CONFLICT (username) DO UPDATE SET is_admin = TRUE, updated_at = NOW()
                RETURNING *
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.location)
            .fetch_one(&self.pool),
        )
        .await
    }
}
