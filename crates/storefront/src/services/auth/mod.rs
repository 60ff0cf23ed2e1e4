//! Identity resolution.
//!
//! Checkout needs the signed-in user's id and (for the HTTP data service)
//! their access token. [`IdentityProvider`] is the seam; the managed
//! service's hosted sign-in flow is outside this crate, so
//! [`SessionIdentity`] simply holds whoever the front end signed in.

mod error;

pub use error::AuthError;

use std::future::Future;

use secrecy::SecretString;
use tokio::sync::RwLock;

use shopwave_core::{Email, UserId};

use crate::config::AuthConfig;
use crate::error::{clear_sentry_user, set_sentry_user};

/// The signed-in user.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct AuthenticatedUser {
    /// Identity provider subject; orders are owned by this id.
    pub id: UserId,
    /// Email shown in the header greeting.
    pub email: Option<Email>,
    /// Access token for owner writes.
    pub token: Option<SecretString>,
}

impl AuthenticatedUser {
    /// Create a user without email or token.
    #[must_use]
    pub const fn new(id: UserId) -> Self {
        Self {
            id,
            email: None,
            token: None,
        }
    }

    /// Attach an access token for owner writes.
    #[must_use]
    pub fn with_token(mut self, token: SecretString) -> Self {
        self.token = Some(token);
        self
    }

    /// Header greeting, e.g. `Hello, shopper@shopwave.com`.
    #[must_use]
    pub fn greeting(&self) -> String {
        self.email.as_ref().map_or_else(
            || format!("Hello, {}", self.id),
            |email| format!("Hello, {email}"),
        )
    }
}

impl std::fmt::Debug for AuthenticatedUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedUser")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Resolves the current user and signs them out.
pub trait IdentityProvider: Send + Sync {
    /// The signed-in user.
    ///
    /// Fails with [`AuthError::NotAuthenticated`] when nobody is signed in.
    fn current_user(&self) -> impl Future<Output = Result<AuthenticatedUser, AuthError>> + Send;

    /// Sign the current user out. Signing out when nobody is signed in is a
    /// no-op.
    fn sign_out(&self) -> impl Future<Output = Result<(), AuthError>> + Send;
}

/// Session-scoped identity holder.
#[derive(Debug, Default)]
pub struct SessionIdentity {
    user: RwLock<Option<AuthenticatedUser>>,
}

impl SessionIdentity {
    /// A session with nobody signed in.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A session with the given user signed in.
    #[must_use]
    pub fn signed_in(user: AuthenticatedUser) -> Self {
        set_sentry_user(&user.id, user.email.as_ref().map(Email::as_str));
        Self {
            user: RwLock::new(Some(user)),
        }
    }

    /// Build a session from configured identity settings.
    ///
    /// No settings means an anonymous session.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidEmail`] for a malformed email, or
    /// [`AuthError::MissingUserId`] when an email or token is configured
    /// without a user id.
    pub fn from_config(config: &AuthConfig) -> Result<Self, AuthError> {
        let Some(user_id) = &config.user_id else {
            if config.email.is_some() || config.token.is_some() {
                return Err(AuthError::MissingUserId);
            }
            return Ok(Self::anonymous());
        };

        let email = config.email.as_deref().map(Email::parse).transpose()?;

        Ok(Self::signed_in(AuthenticatedUser {
            id: UserId::new(user_id.as_str()),
            email,
            token: config.token.clone(),
        }))
    }

    /// Replace the signed-in user.
    pub async fn sign_in(&self, user: AuthenticatedUser) {
        set_sentry_user(&user.id, user.email.as_ref().map(Email::as_str));
        tracing::info!(user_id = %user.id, "Signed in");
        *self.user.write().await = Some(user);
    }
}

impl IdentityProvider for SessionIdentity {
    async fn current_user(&self) -> Result<AuthenticatedUser, AuthError> {
        self.user
            .read()
            .await
            .clone()
            .ok_or(AuthError::NotAuthenticated)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if let Some(user) = self.user.write().await.take() {
            tracing::info!(user_id = %user.id, "Signed out");
            clear_sentry_user();
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_anonymous_session_is_not_authenticated() {
        let identity = SessionIdentity::anonymous();
        assert!(matches!(
            identity.current_user().await,
            Err(AuthError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn test_sign_in_then_out() {
        let identity = SessionIdentity::anonymous();
        identity
            .sign_in(AuthenticatedUser::new(UserId::new("sub-1")))
            .await;
        assert_eq!(identity.current_user().await.unwrap().id.as_str(), "sub-1");

        identity.sign_out().await.unwrap();
        assert!(identity.current_user().await.is_err());

        // Signing out twice is harmless
        identity.sign_out().await.unwrap();
    }

    #[tokio::test]
    async fn test_from_config() {
        let config = AuthConfig {
            user_id: Some("sub-9".to_string()),
            email: Some("shopper@shopwave.test".to_string()),
            token: None,
        };
        let identity = SessionIdentity::from_config(&config).unwrap();
        let user = identity.current_user().await.unwrap();
        assert_eq!(user.greeting(), "Hello, shopper@shopwave.test");

        let anonymous = SessionIdentity::from_config(&AuthConfig::default()).unwrap();
        assert!(anonymous.current_user().await.is_err());
    }

    #[test]
    fn test_from_config_rejects_partial_identity() {
        let config = AuthConfig {
            user_id: None,
            email: Some("shopper@shopwave.test".to_string()),
            token: None,
        };
        assert!(matches!(
            SessionIdentity::from_config(&config),
            Err(AuthError::MissingUserId)
        ));

        let config = AuthConfig {
            user_id: Some("sub-1".to_string()),
            email: Some("not-an-email".to_string()),
            token: None,
        };
        assert!(matches!(
            SessionIdentity::from_config(&config),
            Err(AuthError::InvalidEmail(_))
        ));
    }

    #[test]
    fn test_debug_redacts_token() {
        let user = AuthenticatedUser {
            id: UserId::new("sub-1"),
            email: None,
            token: Some(SecretString::from("super-secret-token")),
        };
        let debug = format!("{user:?}");
        assert!(!debug.contains("super-secret-token"));
        assert!(debug.contains("[REDACTED]"));
    }
}
