//! Manage json web tokens.

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

const ISSUER: &str = "induk";
const HOUR: u64 = 60 * 60;

/// Pieces of information asserted on a JWT.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID.
    pub sub: String,
    pub username: String,
    /// Identifies the organization that issued the JWT.
    pub iss: String,
    /// Identifies the time at which the JWT was issued, in seconds.
    pub iat: u64,
    /// Token must not be accepted before this time.
    pub nbf: u64,
    /// Identifies the expiration time on or after which the JWT must not be
    /// accepted for processing.
    pub exp: u64,
}

impl Claims {
    /// Numeric user ID carried by `sub`.
    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

/// Error raised while handling tokens.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token secret must not be empty")]
    MissingSecret,
    #[error("system clock is before unix epoch")]
    Clock(#[from] std::time::SystemTimeError),
    #[error(transparent)]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

/// Manage HS256 signed tokens.
#[derive(Clone)]
pub struct TokenManager {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry: u64,
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("algorithm", &self.algorithm)
            .field("expiry", &self.expiry)
            .finish_non_exhaustive()
    }
}

impl TokenManager {
    /// Create a new [`TokenManager`] signing with `secret`.
    pub fn new(secret: &str, expiry_hours: u64) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }

        Ok(Self {
            algorithm: Algorithm::HS256,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry: expiry_hours * HOUR,
        })
    }

    /// Token lifetime in seconds.
    pub fn expires_in(&self) -> u64 {
        self.expiry
    }

    /// Create a new signed token for `user_id`.
    pub fn create(&self, user_id: i64, username: &str) -> Result<String, TokenError> {
        let time = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_owned(),
            iss: ISSUER.to_owned(),
            iat: time,
            nbf: time,
            exp: time + self.expiry,
        };

        Ok(encode(&Header::new(self.algorithm), &claims, &self.encoding_key)?)
    }

    /// Decode and check a token.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.set_issuer(&[ISSUER]);
        validation.validate_nbf = true;

        Ok(decode::<Claims>(token, &self.decoding_key, &validation)?.claims)
    }
}
