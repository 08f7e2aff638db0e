//! Shared test helpers — available to all `#[cfg(test)]` modules in the
//! crate.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::config::{self, Configuration};
use crate::crypto::PasswordManager;
use crate::error::{Result, ServerError};
use crate::session::SessionManager;
use crate::token::TokenManager;
use crate::user::{CredentialStore, ProfilePatch, User};
use crate::{AppState, mail, payment, storage};

pub const ACCESS_SECRET: &str = "access-secret-for-tests";
pub const REFRESH_SECRET: &str = "refresh-secret-for-tests";
pub const PAYMENT_SECRET: &str = "gateway-test-secret";
pub const ISSUER: &str = "https://reelhub.example.com/";

/// Argon2 parameters kept tiny for test speed.
fn test_password_manager() -> PasswordManager {
    PasswordManager::new(Some(config::Argon2 {
        memory_cost: 8,
        iterations: 1,
        parallelism: 1,
        hash_length: 32,
    }))
    .unwrap()
}

fn test_token_config() -> config::Token {
    config::Token {
        access_secret: ACCESS_SECRET.into(),
        refresh_secret: REFRESH_SECRET.into(),
        access_ttl_secs: 900,
        refresh_ttl_secs: 1_296_000,
    }
}

/// A [`TokenManager`] sharing the secrets of [`test_state`].
pub fn test_token_manager() -> TokenManager {
    TokenManager::new(ISSUER, &test_token_config()).unwrap()
}

/// A [`TokenManager`] with unrelated secrets, for forged-token cases.
pub fn foreign_token_manager() -> TokenManager {
    TokenManager::new(
        ISSUER,
        &config::Token {
            access_secret: "unrelated-access-secret".into(),
            refresh_secret: "unrelated-refresh-secret".into(),
            access_ttl_secs: 900,
            refresh_ttl_secs: 1_296_000,
        },
    )
    .unwrap()
}

/// In-memory [`CredentialStore`] double.
///
/// Mirrors the uniqueness and refresh-token semantics of the PostgreSQL
/// adapter, plus direct accessors for assertions.
pub struct MemoryCredentialStore {
    users: RwLock<HashMap<String, User>>,
    pwd: PasswordManager,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            pwd: test_password_manager(),
        }
    }

    /// Currently stored refresh token, if any.
    pub async fn stored_refresh_token(&self, id: &str) -> Option<String> {
        self.users
            .read()
            .await
            .get(id)
            .and_then(|user| user.refresh_token.clone())
    }

    /// Currently stored password hash.
    pub async fn stored_password(&self, id: &str) -> Option<String> {
        self.users.read().await.get(id).map(|user| user.password.clone())
    }

    /// Drop an account entirely, as an account deletion would.
    pub async fn remove_user(&self, id: &str) {
        self.users.write().await.remove(id);
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_email_or_username(
        &self,
        identifier: &str,
    ) -> Result<Option<User>> {
        let identifier = identifier.to_lowercase();
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| {
                user.email == identifier || user.username == identifier
            })
            .cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let username = username.to_lowercase();
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn insert(&self, user: &User) -> Result<User> {
        let mut users = self.users.write().await;
        if users.values().any(|existing| {
            existing.username == user.username || existing.email == user.email
        }) {
            return Err(ServerError::Conflict);
        }

        let mut user = user.clone();
        user.password = self.pwd.hash_password(&user.password)?;
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    fn verify_password(&self, user: &User, plaintext: &str) -> bool {
        self.pwd.verify_password(plaintext, &user.password)
    }

    async fn set_refresh_token(
        &self,
        id: &str,
        token: Option<&str>,
    ) -> Result<()> {
        if let Some(user) = self.users.write().await.get_mut(id) {
            user.refresh_token = token.map(str::to_owned);
        }
        Ok(())
    }

    async fn update_password(&self, id: &str, plaintext: &str) -> Result<()> {
        let password = self.pwd.hash_password(plaintext)?;
        if let Some(user) = self.users.write().await.get_mut(id) {
            user.password = password;
        }
        Ok(())
    }

    async fn update_profile(
        &self,
        id: &str,
        patch: &ProfilePatch,
    ) -> Result<User> {
        let mut users = self.users.write().await;

        if let Some(username) = &patch.username {
            if users
                .values()
                .any(|u| u.id != id && u.username == *username)
            {
                return Err(ServerError::Conflict);
            }
        }
        if let Some(email) = &patch.email {
            if users.values().any(|u| u.id != id && u.email == *email) {
                return Err(ServerError::Conflict);
            }
        }

        let user = users.get_mut(id).ok_or(ServerError::NotFound)?;
        if let Some(username) = &patch.username {
            user.username = username.clone();
        }
        if let Some(email) = &patch.email {
            user.email = email.clone();
        }
        if let Some(full_name) = &patch.full_name {
            user.full_name = full_name.clone();
        }
        Ok(user.clone())
    }

    async fn set_avatar(&self, id: &str, url: &str) -> Result<User> {
        let mut users = self.users.write().await;
        let user = users.get_mut(id).ok_or(ServerError::NotFound)?;
        user.avatar = Some(url.to_owned());
        Ok(user.clone())
    }

    async fn set_cover_image(&self, id: &str, url: &str) -> Result<User> {
        let mut users = self.users.write().await;
        let user = users.get_mut(id).ok_or(ServerError::NotFound)?;
        user.cover_image = Some(url.to_owned());
        Ok(user.clone())
    }
}

/// A minimal [`Configuration`] suitable for handler tests.
pub fn test_config() -> Arc<Configuration> {
    let mut config = Configuration::default();
    config.name = "reelhub".into();
    config.url = ISSUER.into();
    config.token = Some(test_token_config());
    config.payment = Some(config::Payment {
        key_secret: PAYMENT_SECRET.into(),
    });

    Arc::new(config)
}

/// Build a full [`AppState`] around an in-memory store.
///
/// Mail and media storage stay unconfigured: events drop with a debug log
/// and uploads answer 500.
pub fn test_state() -> (AppState, Arc<MemoryCredentialStore>) {
    let store = Arc::new(MemoryCredentialStore::new());
    let config = test_config();
    let token = test_token_manager();
    let session = SessionManager::new(
        Arc::clone(&store) as Arc<dyn CredentialStore>,
        token.clone(),
    );

    let state = AppState {
        payment: payment::PaymentGateway::new(config.payment.clone()),
        config,
        store: Arc::clone(&store) as Arc<dyn CredentialStore>,
        token,
        session,
        mail: mail::MailManager::default(),
        storage: storage::MediaStorage::default(),
    };

    (state, store)
}

/// Insert a ready-made account; returns the stored (hashed) user.
pub async fn seed_user(
    store: &MemoryCredentialStore,
    username: &str,
    email: &str,
    password: &str,
) -> User {
    let user = User::builder()
        .username(username)
        .email(email)
        .full_name(format!("{username} Example"))
        .password(password)
        .build();

    store.insert(&user).await.unwrap()
}
