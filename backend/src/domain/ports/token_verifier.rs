//! Port abstraction for Google ID token verification.

use async_trait::async_trait;

/// Claims extracted from a verified Google ID token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleClaims {
    /// Verified email address.
    pub email: String,
    /// Profile picture URL, when Google supplies one.
    pub picture: Option<String>,
    /// The OAuth client the token was minted for.
    pub audience: Option<String>,
}

/// Verification failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenVerificationError {
    /// The token was rejected as invalid or expired.
    #[error("google token rejected: {message}")]
    Rejected { message: String },
    /// The token verified but was minted for a different OAuth client.
    #[error("google token audience mismatch")]
    AudienceMismatch,
    /// The verification endpoint could not be reached.
    #[error("google token verification unavailable: {message}")]
    Unavailable { message: String },
}

impl TokenVerificationError {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

/// Verifier port for Google-issued ID tokens.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GoogleTokenVerifier: Send + Sync {
    /// Verify `id_token` and return its claims.
    async fn verify(&self, id_token: &str) -> Result<GoogleClaims, TokenVerificationError>;
}
