//! Authentication failure reasons.
//!
//! Every variant collapses into the same 401 at the middleware boundary.
//! The variant itself is kept for logs only.
use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("malformed token: {0}")]
    MalformedToken(String),

    #[error("missing or malformed credential")]
    MissingCredential,

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("key set unavailable: {0}")]
    KeySetUnavailable(String),

    #[error("unknown key id: {0}")]
    UnknownKey(String),

    #[error("invalid signature")]
    InvalidSignature,

    #[error("token expired")]
    TokenExpired,
}

impl AuthError {
    /// Stable label used as the `kind` field in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedToken(_) => "malformed_token",
            Self::MissingCredential => "missing_credential",
            Self::UnsupportedAlgorithm(_) => "unsupported_algorithm",
            Self::KeySetUnavailable(_) => "key_set_unavailable",
            Self::UnknownKey(_) => "unknown_key",
            Self::InvalidSignature => "invalid_signature",
            Self::TokenExpired => "token_expired",
        }
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedToken(reason.into())
    }

    pub(crate) fn key_set(reason: impl Into<String>) -> Self {
        Self::KeySetUnavailable(reason.into())
    }
}
