//! Typed builder for User.

use rand::RngCore;

use crate::user::User;

const ID_BYTES: usize = 12;

/// [`User`] builder.
///
/// `username` and `email` are tracked at the type level so an incomplete
/// account cannot be built.
#[derive(Debug, Clone)]
pub struct UserBuilder<Username, Email> {
    username: Username,
    email: Email,
    full_name: String,
    password: String,
}

/// Value is missing on [`UserBuilder`].
#[derive(Debug, Clone)]
pub struct Missing;

/// Value is present on [`UserBuilder`].
#[derive(Debug, Clone)]
pub struct Present<T>(pub T);

impl UserBuilder<Missing, Missing> {
    /// Create a new [`UserBuilder`].
    pub fn new() -> Self {
        Self {
            username: Missing,
            email: Missing,
            full_name: String::default(),
            password: String::default(),
        }
    }
}

impl Default for UserBuilder<Missing, Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Email> UserBuilder<Missing, Email> {
    /// Update `username` field on [`UserBuilder`].
    pub fn username(
        self,
        username: impl Into<String>,
    ) -> UserBuilder<Present<String>, Email> {
        UserBuilder {
            username: Present(username.into().to_lowercase()),
            email: self.email,
            full_name: self.full_name,
            password: self.password,
        }
    }
}

impl<Username> UserBuilder<Username, Missing> {
    /// Update `email` field on [`UserBuilder`].
    pub fn email(
        self,
        email: impl Into<String>,
    ) -> UserBuilder<Username, Present<String>> {
        UserBuilder {
            username: self.username,
            email: Present(email.into().to_lowercase()),
            full_name: self.full_name,
            password: self.password,
        }
    }
}

impl<Username, Email> UserBuilder<Username, Email> {
    /// Update `full_name` field on [`UserBuilder`].
    pub fn full_name(mut self, full_name: impl ToString) -> Self {
        self.full_name = full_name.to_string();
        self
    }

    /// Update `password` field on [`UserBuilder`].
    ///
    /// The value stays plaintext until the store hashes it on insert.
    pub fn password(mut self, password: impl ToString) -> Self {
        self.password = password.to_string();
        self
    }
}

impl UserBuilder<Present<String>, Present<String>> {
    /// Build a [`User`] with a freshly generated opaque ID.
    pub fn build(self) -> User {
        let mut bytes = [0u8; ID_BYTES];
        rand::rngs::OsRng.fill_bytes(&mut bytes);

        User {
            id: hex::encode(bytes),
            username: self.username.0,
            email: self.email.0,
            full_name: self.full_name,
            password: self.password,
            ..Default::default()
        }
    }
}
