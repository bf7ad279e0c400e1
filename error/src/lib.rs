//! Error types for signed claims tokens.
//!
//! `TokenError` carries the detailed failure; `TokenErrorKind` is the closed
//! set of categories callers branch on.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures raised while issuing or reading a token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("invalid signing key: {0}")]
    InvalidKey(String),

    #[error("token encoding failed: {0}")]
    Encoding(String),

    #[error("unexpected signing method: {0}")]
    UnexpectedAlgorithm(String),

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("signature is invalid")]
    InvalidSignature,

    #[error("token is expired")]
    Expired,

    #[error("invalid jwt: claim validation failed: {0}")]
    ClaimValidation(String),

    #[error("invalid jwt: could not read claims")]
    InvalidClaims,
}

/// Coarse failure category of a [`TokenError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenErrorKind {
    /// The secret key was unusable.
    InvalidKey,
    /// Claims could not be serialized or signed.
    Encoding,
    /// The token header named a non-HMAC algorithm.
    UnexpectedAlgorithm,
    /// Structure, signature, expiry or time-window check failed.
    Verification,
    /// The token verified but carried no usable custom claims.
    InvalidClaimsShape,
}

impl TokenError {
    /// Category of this error.
    pub fn kind(&self) -> TokenErrorKind {
        match self {
            Self::InvalidKey(_) => TokenErrorKind::InvalidKey,
            Self::Encoding(_) => TokenErrorKind::Encoding,
            Self::UnexpectedAlgorithm(_) => TokenErrorKind::UnexpectedAlgorithm,
            Self::Malformed(_)
            | Self::InvalidSignature
            | Self::Expired
            | Self::ClaimValidation(_) => TokenErrorKind::Verification,
            Self::InvalidClaims => TokenErrorKind::InvalidClaimsShape,
        }
    }

    /// Whether the token was rejected because it is past its `exp`.
    pub fn is_expired(&self) -> bool {
        matches!(self, Self::Expired)
    }
}

/// Error response for API clients.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Add details to the error response.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl From<TokenError> for ErrorResponse {
    // Only key and encoding failures carry details.
    fn from(err: TokenError) -> Self {
        let (code, message) = match &err {
            TokenError::InvalidKey(_) => ("TOKEN_INVALID_KEY", "Signing key is not usable"),
            TokenError::Encoding(_) => ("TOKEN_ENCODING_FAILED", "Failed to create token"),
            TokenError::UnexpectedAlgorithm(_) => {
                ("TOKEN_UNEXPECTED_ALGORITHM", "Unexpected signing method")
            }
            TokenError::Expired => ("TOKEN_EXPIRED", "Token has expired"),
            TokenError::Malformed(_)
            | TokenError::InvalidSignature
            | TokenError::ClaimValidation(_) => ("TOKEN_INVALID", "Invalid token"),
            TokenError::InvalidClaims => ("TOKEN_INVALID_CLAIMS", "Could not read token claims"),
        };
        match err.kind() {
            TokenErrorKind::InvalidKey | TokenErrorKind::Encoding => {
                Self::new(code, message).with_details(err.to_string())
            }
            _ => Self::new(code, message),
        }
    }
}
