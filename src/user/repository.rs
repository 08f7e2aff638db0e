//! Credential store port and its PostgreSQL adapter.

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::config;
use crate::crypto::PasswordManager;
use crate::error::{Result, ServerError};
use crate::user::User;

pub const DEFAULT_CREDENTIALS: &str = "postgres";
pub const DEFAULT_DATABASE_NAME: &str = "reelhub";
pub const DEFAULT_POOL_SIZE: u32 = 10;

const COLUMNS: &str = "id, username, email, full_name, avatar, cover_image, \
                       password, refresh_token, created_at, updated_at";

/// Profile fields an account may change after registration.
#[derive(Debug, Default, Clone)]
pub struct ProfilePatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
}

/// Port over user credentials and profile persistence.
///
/// The single source of truth for refresh-token validity; conflicting writes
/// to the same account's token serialize at the backing store.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find an account whose email or username equals `identifier`.
    async fn find_by_email_or_username(
        &self,
        identifier: &str,
    ) -> Result<Option<User>>;

    /// Find an account by its opaque ID.
    async fn find_by_id(&self, id: &str) -> Result<Option<User>>;

    /// Find an account by username only.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Insert a new account. `user.password` is plaintext and hashed here;
    /// a duplicate username or email yields [`ServerError::Conflict`].
    async fn insert(&self, user: &User) -> Result<User>;

    /// Check `plaintext` against the account's stored hash.
    fn verify_password(&self, user: &User, plaintext: &str) -> bool;

    /// Replace the stored refresh token; `None` clears it.
    async fn set_refresh_token(
        &self,
        id: &str,
        token: Option<&str>,
    ) -> Result<()>;

    /// Replace the account password. Re-hashed internally.
    async fn update_password(&self, id: &str, plaintext: &str) -> Result<()>;

    /// Apply profile changes, returning the updated account.
    async fn update_profile(
        &self,
        id: &str,
        patch: &ProfilePatch,
    ) -> Result<User>;

    /// Persist a new avatar URL, returning the updated account.
    async fn set_avatar(&self, id: &str, url: &str) -> Result<User>;

    /// Persist a new cover image URL, returning the updated account.
    async fn set_cover_image(&self, id: &str, url: &str) -> Result<User>;
}

/// [`CredentialStore`] adapter backed by PostgreSQL.
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
    pwd: PasswordManager,
}

impl PgCredentialStore {
    /// Create a new [`PgCredentialStore`] over an existing pool.
    pub fn new(pool: PgPool, pwd: PasswordManager) -> Self {
        Self { pool, pwd }
    }

    /// Connect to PostgreSQL from configuration.
    pub async fn connect(
        config: &config::Postgres,
        pwd: PasswordManager,
    ) -> std::result::Result<Self, sqlx::Error> {
        let username = config
            .username
            .clone()
            .unwrap_or(DEFAULT_CREDENTIALS.into());
        let password = config
            .password
            .clone()
            .unwrap_or(DEFAULT_CREDENTIALS.into());
        let database = config
            .database
            .clone()
            .unwrap_or(DEFAULT_DATABASE_NAME.into());

        let addr = format!(
            "postgres://{username}:{password}@{}/{database}",
            config.address
        );
        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size.unwrap_or(DEFAULT_POOL_SIZE))
            .connect(&addr)
            .await?;

        tracing::info!(
            hostname = config.address.as_str(),
            database = database.as_str(),
            "postgres connected"
        );

        Ok(Self::new(pool, pwd))
    }

    /// Underlying pool, exposed for startup migrations.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_by(&self, predicate: &str, value: &str) -> Result<Option<User>> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE {predicate}");

        sqlx::query_as::<_, User>(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(ServerError::Sql)
    }
}

// A unique-index violation means the identity already exists; everything
// else is a store failure.
fn map_unique_violation(err: sqlx::Error) -> ServerError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            ServerError::Conflict
        },
        _ => ServerError::Sql(err),
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_email_or_username(
        &self,
        identifier: &str,
    ) -> Result<Option<User>> {
        self.fetch_by(
            "email = $1 OR username = $1",
            &identifier.to_lowercase(),
        )
        .await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        self.fetch_by("id = $1", id).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        self.fetch_by("username = $1", &username.to_lowercase()).await
    }

    async fn insert(&self, user: &User) -> Result<User> {
        let password = self.pwd.hash_password(&user.password)?;
        let query = format!(
            "INSERT INTO users (id, username, email, full_name, password)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(&user.id)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.full_name)
            .bind(&password)
            .fetch_one(&self.pool)
            .await
            .map_err(map_unique_violation)
    }

    fn verify_password(&self, user: &User, plaintext: &str) -> bool {
        self.pwd.verify_password(plaintext, &user.password)
    }

    async fn set_refresh_token(
        &self,
        id: &str,
        token: Option<&str>,
    ) -> Result<()> {
        // Single-statement write: the commit point of a rotation. A request
        // aborted before this point leaves the previous token untouched.
        sqlx::query(
            "UPDATE users SET refresh_token = $2, updated_at = NOW()
                WHERE id = $1",
        )
        .bind(id)
        .bind(token)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_password(&self, id: &str, plaintext: &str) -> Result<()> {
        let password = self.pwd.hash_password(plaintext)?;

        sqlx::query(
            "UPDATE users SET password = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(&password)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_profile(
        &self,
        id: &str,
        patch: &ProfilePatch,
    ) -> Result<User> {
        let query = format!(
            "UPDATE users SET
                username = COALESCE($2, username),
                email = COALESCE($3, email),
                full_name = COALESCE($4, full_name),
                updated_at = NOW()
                WHERE id = $1
                RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(patch.username.as_deref())
            .bind(patch.email.as_deref())
            .bind(patch.full_name.as_deref())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_unique_violation)?
            .ok_or(ServerError::NotFound)
    }

    async fn set_avatar(&self, id: &str, url: &str) -> Result<User> {
        let query = format!(
            "UPDATE users SET avatar = $2, updated_at = NOW()
                WHERE id = $1 RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(url)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServerError::NotFound)
    }

    async fn set_cover_image(&self, id: &str, url: &str) -> Result<User> {
        let query = format!(
            "UPDATE users SET cover_image = $2, updated_at = NOW()
                WHERE id = $1 RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(url)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServerError::NotFound)
    }
}
