use std::sync::Arc;

use crate::crypto::PasswordManager;
use crate::error::{Result, ServerError};
use crate::token::TokenManager;
use crate::user::{
    ADMIN_EMAIL, ADMIN_USERNAME, NewUser, User, UserRepository,
};

const INVALID_CREDENTIALS: &str = "invalid username or password";
const DEACTIVATED: &str = "account is deactivated";

/// Successful login.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub expires_in: u64,
    pub user: User,
}

/// Authentication and account management.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    passwords: Arc<PasswordManager>,
    tokens: TokenManager,
}

impl AuthService {
    /// Create a new [`AuthService`].
    pub fn new(
        users: Arc<dyn UserRepository>,
        passwords: Arc<PasswordManager>,
        tokens: TokenManager,
    ) -> Self {
        Self {
            users,
            passwords,
            tokens,
        }
    }

    /// Token manager used to sign sessions.
    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// Check credentials and sign a new token.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or(ServerError::Unauthorized(INVALID_CREDENTIALS))?;

        if !self.passwords.verify_password(password, &user.password_hash) {
            return Err(ServerError::Unauthorized(INVALID_CREDENTIALS));
        }

        if !user.is_active {
            return Err(ServerError::Unauthorized(DEACTIVATED));
        }

        let token = self.tokens.create(user.id, &user.username)?;
        tracing::info!(user_id = user.id, "user logged in");

        Ok(Session {
            token,
            expires_in: self.tokens.expires_in(),
            user,
        })
    }

    /// Create a new administrator account.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User> {
        if self.users.exists(username, email).await? {
            return Err(ServerError::Conflict(
                "username or email already exists".into(),
            ));
        }

        let user = self
            .users
            .insert(&NewUser {
                username: username.to_owned(),
                email: email.to_owned(),
                password_hash: self.passwords.hash_password(password)?,
            })
            .await?;

        tracing::info!(user_id = user.id, %username, "user registered");
        Ok(user)
    }

    /// Account behind a token.
    pub async fn profile(&self, id: i64) -> Result<User> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or(ServerError::NotFound("user"))
    }

    /// Make sure the default administrator exists.
    ///
    /// Returns `true` when the account has been created. An existing
    /// administrator keeps its password.
    pub async fn seed_admin(&self, password: &str) -> Result<bool> {
        if self.users.find_by_username(ADMIN_USERNAME).await?.is_some() {
            tracing::debug!("default administrator already exists");
            return Ok(false);
        }

        self.register(ADMIN_USERNAME, ADMIN_EMAIL, password).await?;
        tracing::info!(username = ADMIN_USERNAME, "default administrator created");

        Ok(true)
    }
}
