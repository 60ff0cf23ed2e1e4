//! Authentication error types.

use thiserror::Error;

/// Errors that can occur while resolving the signed-in user.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Nobody is signed in.
    #[error("not authenticated")]
    NotAuthenticated,

    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] shopwave_core::EmailError),

    /// Identity settings were supplied without a user id.
    #[error("identity configured without a user id")]
    MissingUserId,
}
