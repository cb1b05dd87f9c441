//! Registration, login, and profile lookups.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};

use super::auth::{self, LoginCredentials, TokenCodec};
use super::error::DomainError;
use super::ports::{UserInsertError, UserRepository};
use super::user::{RegistrationDraft, Role, User, UserId};

/// Orchestrates the identity store and the token codec.
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    tokens: TokenCodec,
}

impl AccountService {
    /// Create the service over a user repository and token codec.
    pub fn new(users: Arc<dyn UserRepository>, tokens: TokenCodec) -> Self {
        Self { users, tokens }
    }

    /// Register a new borrower account and issue a first token.
    ///
    /// The uniqueness check is delegated to the store's unique index; a
    /// racing duplicate therefore cannot create a second row.
    #[instrument(skip_all, fields(email = %draft.email()))]
    pub async fn register(&self, draft: RegistrationDraft) -> Result<(String, User), DomainError> {
        let password_hash = auth::hash_password(draft.password())?;
        let user = User {
            id: UserId::generate(),
            full_name: draft.full_name().to_owned(),
            email: draft.email().clone(),
            password_hash,
            role: Role::Borrower,
            created_at: Utc::now(),
        };
        match self.users.insert(&user).await {
            Ok(()) => {}
            Err(UserInsertError::EmailTaken) => {
                return Err(DomainError::conflict("email already registered"));
            }
            Err(UserInsertError::Store(err)) => return Err(err.into()),
        }
        let token = self.tokens.issue(user.id, user.role)?;
        info!(user_id = %user.id, "user registered");
        Ok((token, user))
    }

    /// Verify credentials and issue a token.
    ///
    /// Unknown email and wrong password return the identical error so the
    /// endpoint cannot be used to enumerate accounts.
    #[instrument(skip_all)]
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<(String, User), DomainError> {
        let invalid = || DomainError::unauthorized("invalid credentials");
        let normalized = credentials.email().to_ascii_lowercase();
        let user = self
            .users
            .find_by_email(&normalized)
            .await?
            .ok_or_else(invalid)?;
        if !auth::verify_password(credentials.password(), &user.password_hash) {
            return Err(invalid());
        }
        let token = self.tokens.issue(user.id, user.role)?;
        info!(user_id = %user.id, "login succeeded");
        Ok((token, user))
    }

    /// Load the caller's profile.
    pub async fn profile(&self, id: UserId) -> Result<User, DomainError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("user not found"))
    }
}
