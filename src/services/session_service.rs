use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::{fingerprint, AuthError, TokenPair, TokenService};
use crate::database::models::NewUser;
use crate::database::{Store, StoreError, TokenConsumption};

/// Outcome of a successful registration
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub user_id: Uuid,
}

/// Session lifecycle on top of the stateless [`TokenService`]: every refresh
/// token handed out is recorded in the owner's valid set, and every redemption
/// goes through a single atomic store call.
#[derive(Clone)]
pub struct SessionService {
    tokens: Arc<TokenService>,
    store: Arc<dyn Store>,
}

impl SessionService {
    pub fn new(tokens: Arc<TokenService>, store: Arc<dyn Store>) -> Self {
        Self { tokens, store }
    }

    /// Create an account and open its first session.
    ///
    /// `username` falls back to the email, which is already unique.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        username: Option<&str>,
    ) -> Result<Registration, AuthError> {
        let password_hash = hash_password(password)?;
        let new_user = NewUser {
            email: email.to_string(),
            username: username.unwrap_or(email).to_string(),
            password_hash,
        };

        let user = match self.store.create_user(new_user).await {
            Ok(user) => user,
            Err(StoreError::Conflict(field)) => {
                tracing::info!("Registration rejected: duplicate {}", field);
                return Err(AuthError::RegistrationFailed);
            }
            Err(e) => {
                tracing::error!("Registration failed: {}", e);
                return Err(AuthError::RegistrationFailed);
            }
        };

        let tokens = self
            .open_session(user.id)
            .await?
            .ok_or(AuthError::RegistrationFailed)?;
        tracing::info!("Registered user {}", user.id);

        Ok(Registration {
            tokens,
            user_id: user.id,
        })
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        let user = self
            .store
            .find_user_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash) {
            tracing::info!("Failed login for user {}", user.id);
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self
            .open_session(user.id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        tracing::info!("User {} logged in", user.id);
        Ok(tokens)
    }

    /// Exchange a refresh token for a new pair.
    ///
    /// The presented token is single-use. Presenting one that is no longer in
    /// the owner's set revokes every outstanding refresh token for that user.
    pub async fn refresh(&self, presented: &str) -> Result<TokenPair, AuthError> {
        let user_id = self.tokens.verify_refresh(presented)?;
        let next = self.tokens.issue(user_id)?;

        let outcome = self
            .store
            .consume_refresh_token(
                user_id,
                &fingerprint(presented),
                Some(&fingerprint(&next.refresh_token)),
            )
            .await?;

        match outcome {
            TokenConsumption::Consumed => Ok(next),
            TokenConsumption::Reused => {
                tracing::warn!("Refresh token reuse for user {}; all sessions revoked", user_id);
                Err(AuthError::InvalidRefreshToken)
            }
            TokenConsumption::UserMissing => Err(AuthError::InvalidRefreshToken),
        }
    }

    /// Retire a refresh token without issuing a replacement
    pub async fn logout(&self, presented: &str) -> Result<(), AuthError> {
        let user_id = self.tokens.verify_refresh(presented)?;

        match self
            .store
            .consume_refresh_token(user_id, &fingerprint(presented), None)
            .await?
        {
            TokenConsumption::Consumed => {
                tracing::info!("User {} logged out", user_id);
                Ok(())
            }
            TokenConsumption::Reused => {
                tracing::warn!("Logout with spent refresh token for user {}; all sessions revoked", user_id);
                Err(AuthError::InvalidRefreshToken)
            }
            TokenConsumption::UserMissing => Err(AuthError::InvalidRefreshToken),
        }
    }

    /// Issue a pair and record its refresh token before handing it out.
    ///
    /// `None` when the account vanished between lookup and token bookkeeping;
    /// callers pick the error that fits their operation.
    async fn open_session(&self, user_id: Uuid) -> Result<Option<TokenPair>, AuthError> {
        let tokens = self.tokens.issue(user_id)?;
        let recorded = self
            .store
            .push_refresh_token(user_id, &fingerprint(&tokens.refresh_token))
            .await?;
        Ok(recorded.then_some(tokens))
    }
}
