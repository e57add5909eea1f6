pub mod password;
pub mod policy;
pub mod token;

use thiserror::Error;

use crate::database::StoreError;

pub use policy::authorize_owner_action;
pub use token::{fingerprint, Claims, TokenKind, TokenPair, TokenService};

/// Failures of the session and authorization layer.
///
/// Token failures are deliberately coarse: bad signature, malformed input,
/// wrong token kind and expiry are all the same variant.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Error registering user")]
    RegistrationFailed,

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Token encoding failed: {0}")]
    TokenEncoding(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
