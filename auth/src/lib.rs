//! Signed claims tokens.
//!
//! This crate issues HS256 JWTs wrapping an arbitrary custom claims payload
//! with an optional expiration, and reads them back after verifying the
//! signing method, signature and time window.
//!
//! ```
//! use chrono::Duration;
//! use serde_json::json;
//!
//! let issued = auth::issue("s3cr3t", &json!({"role": "admin"}), Some(Duration::hours(1))).unwrap();
//! let claims = auth::read("s3cr3t", &issued.token).unwrap();
//! assert_eq!(claims["role"], "admin");
//! ```

mod claims;
mod config;
mod token;

pub use claims::{StandardClaims, TokenClaims};
pub use config::TokenConfig;
pub use error::{ErrorResponse, TokenError, TokenErrorKind};
pub use token::{issue, read, read_as, IssuedToken, SIGNING_ALGORITHM};
