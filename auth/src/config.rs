//! Token configuration.

use chrono::Duration;
use error::TokenError;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::token::{self, IssuedToken};

/// Secret and default lifetime for issuing and reading tokens.
#[derive(Debug, Deserialize)]
pub struct TokenConfig {
    /// Shared secret for signing tokens
    #[serde(deserialize_with = "secret_string")]
    pub secret: SecretString,
    /// Token validity duration in seconds; `None` issues non-expiring tokens
    #[serde(default)]
    pub expires_in_secs: Option<i64>,
}

impl TokenConfig {
    /// Create a new configuration issuing non-expiring tokens.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: SecretString::from(secret.into()),
            expires_in_secs: None,
        }
    }

    /// Set the token validity duration.
    pub fn with_expires_in_secs(mut self, secs: i64) -> Self {
        self.expires_in_secs = Some(secs);
        self
    }

    /// Issue tokens without an expiration.
    pub fn without_expiry(mut self) -> Self {
        self.expires_in_secs = None;
        self
    }

    /// Lifetime applied by [`TokenConfig::issue`].
    ///
    /// Fails when `expires_in_secs` does not fit a [`Duration`].
    pub fn ttl(&self) -> Result<Option<Duration>, TokenError> {
        self.expires_in_secs
            .map(|secs| {
                Duration::try_seconds(secs).ok_or_else(|| {
                    TokenError::Encoding("expiration is out of range".to_string())
                })
            })
            .transpose()
    }

    /// Issue a token with the configured secret and lifetime.
    pub fn issue<C: Serialize + ?Sized>(&self, claims: &C) -> Result<IssuedToken, TokenError> {
        token::issue(self.secret.expose_secret(), claims, self.ttl()?)
    }

    /// Read a token's custom claims with the configured secret.
    pub fn read(&self, token: &str) -> Result<Map<String, Value>, TokenError> {
        token::read(self.secret.expose_secret(), token)
    }

    /// Read a token's custom claims into `C` with the configured secret.
    pub fn read_as<C: DeserializeOwned>(&self, token: &str) -> Result<C, TokenError> {
        token::read_as(self.secret.expose_secret(), token)
    }
}

fn secret_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SecretString, D::Error> {
    String::deserialize(deserializer).map(SecretString::from)
}
