//! Manage json web tokens.

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::config;
use crate::user::User;

/// Current [`Claims`] layout version.
const CLAIMS_VERSION: u8 = 1;

const JTI_BYTES: usize = 8;

/// Pieces of information asserted on a JWT.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Claims {
    /// Claims layout version.
    #[serde(default)]
    pub v: u8,
    /// Identifies the organization that issued the JWT.
    pub iss: String,
    /// User ID.
    pub sub: String,
    /// Email at issuance time.
    pub email: String,
    /// Username at issuance time.
    pub username: String,
    /// Display name at issuance time.
    pub name: String,
    /// Identifies the time at which the JWT was issued.
    pub iat: u64,
    /// Identifies the expiration time on or after which the JWT must not be
    /// accepted for processing.
    pub exp: u64,
    /// Unique identifier for the JWT.
    ///
    /// Two pairs minted for the same account within the same second would
    /// otherwise be byte-identical, turning a rotation into a no-op.
    pub jti: String,
}

/// Freshly signed access/refresh token pair.
#[derive(Clone, Debug)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Why a token could not be issued or trusted.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token signature is invalid")]
    BadSignature,
    #[error("token is malformed")]
    Malformed,
    #[error("token secret is absent or unusable")]
    Misconfigured,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::BadSignature,
            _ => TokenError::Malformed,
        }
    }
}

#[derive(Clone)]
struct Signer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: u64,
}

impl Signer {
    fn new(secret: &str, ttl: u64) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::Misconfigured);
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        })
    }
}

/// Manage JWT tokens.
///
/// Access and refresh tokens are signed with independent secrets and
/// expiries, so compromise of one secret does not forge the other kind.
#[derive(Clone)]
pub struct TokenManager {
    algorithm: Algorithm,
    issuer: String,
    access: Signer,
    refresh: Signer,
}

impl TokenManager {
    /// Create a new [`TokenManager`] instance.
    pub fn new(
        issuer: &str,
        config: &config::Token,
    ) -> Result<Self, TokenError> {
        Ok(Self {
            algorithm: Algorithm::HS256,
            issuer: issuer.to_owned(),
            access: Signer::new(&config.access_secret, config.access_ttl_secs)?,
            refresh: Signer::new(
                &config.refresh_secret,
                config.refresh_ttl_secs,
            )?,
        })
    }

    /// Access token lifetime in seconds.
    pub fn access_ttl(&self) -> u64 {
        self.access.ttl
    }

    /// Refresh token lifetime in seconds.
    pub fn refresh_ttl(&self) -> u64 {
        self.refresh.ttl
    }

    /// Sign a new access/refresh pair binding `user`'s identity at issuance
    /// time.
    pub fn issue_pair(&self, user: &User) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.create(user, &self.access)?,
            refresh_token: self.create(user, &self.refresh)?,
        })
    }

    fn create(&self, user: &User, signer: &Signer) -> Result<String, TokenError> {
        let now = chrono::Utc::now().timestamp() as u64;
        let mut jti = [0u8; JTI_BYTES];
        rand::rngs::OsRng.fill_bytes(&mut jti);

        let header = Header::new(self.algorithm);
        let claims = Claims {
            v: CLAIMS_VERSION,
            iss: self.issuer.clone(),
            sub: user.id.clone(),
            email: user.email.clone(),
            username: user.username.clone(),
            name: user.full_name.clone(),
            iat: now,
            exp: now + signer.ttl,
            jti: hex::encode(jti),
        };

        encode(&header, &claims, &signer.encoding)
            .map_err(|_| TokenError::Misconfigured)
    }

    /// Decode and check an access token.
    pub fn decode_access(&self, token: &str) -> Result<Claims, TokenError> {
        self.decode(token, &self.access)
    }

    /// Decode and check a refresh token.
    pub fn decode_refresh(&self, token: &str) -> Result<Claims, TokenError> {
        self.decode(token, &self.refresh)
    }

    // Signature is checked before any claim is trusted; expiry is recomputed
    // here from the signed `exp`, with no leeway.
    fn decode(&self, token: &str, signer: &Signer) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;

        Ok(decode::<Claims>(token, &signer.decoding, &validation)?.claims)
    }
}
