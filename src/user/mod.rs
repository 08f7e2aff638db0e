mod builder;
mod repository;

pub use builder::*;
pub use repository::*;

use serde::{Deserialize, Serialize};

/// User as saved on database.
///
/// Serialization is the sanitized identity view: credential fields carry
/// `#[serde(skip)]` and never reach a client.
#[derive(
    Clone, Debug, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow,
)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: Option<String>,
    pub cover_image: Option<String>,
    #[serde(skip)]
    pub password: String,
    #[serde(skip)]
    pub refresh_token: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl User {
    /// Start a typed [`UserBuilder`].
    pub fn builder() -> UserBuilder<Missing, Missing> {
        UserBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_user_is_sanitized() {
        let user = User {
            id: "9f3a61c2b4d5e6f7a8091a2b".into(),
            username: "alice".into(),
            email: "alice@example.com".into(),
            full_name: "Alice Example".into(),
            password: "$argon2id$v=19$m=8,t=1,p=1$secret".into(),
            refresh_token: Some("opaque".into()),
            ..Default::default()
        };

        let value = serde_json::to_value(&user).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object["username"], "alice");
        assert_eq!(object["fullName"], "Alice Example");
        assert!(!object.contains_key("password"));
        assert!(!object.contains_key("refreshToken"));
        assert!(!object.contains_key("refresh_token"));
    }
}
