//! Token claims: the caller's payload plus the registered time claims.

use chrono::{DateTime, Utc};
use error::TokenError;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Number;

/// Full token body.
///
/// Serializes as `{"custom_claims": ..., "exp": ...}` with the standard
/// claims flattened into the top level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims<C> {
    /// Application-defined payload
    pub custom_claims: C,
    /// Registered claims
    #[serde(flatten)]
    pub standard: StandardClaims,
}

/// Registered JWT claims understood by this crate.
///
/// All timestamps are Unix seconds. A missing or zero value means the claim
/// is not set. Fractional values are accepted on decode and floored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardClaims {
    /// Expiration time
    #[serde(
        rename = "exp",
        default,
        deserialize_with = "numeric_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub expires_at: Option<i64>,
    /// Not before
    #[serde(
        rename = "nbf",
        default,
        deserialize_with = "numeric_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub not_before: Option<i64>,
    /// Issued at
    #[serde(
        rename = "iat",
        default,
        deserialize_with = "numeric_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub issued_at: Option<i64>,
}

impl StandardClaims {
    /// Claims expiring at the given Unix timestamp.
    pub fn expiring_at(expires_at: i64) -> Self {
        Self {
            expires_at: Some(expires_at),
            ..Self::default()
        }
    }

    /// Expiration as a UTC date, if set.
    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        set(self.expires_at).and_then(|ts| DateTime::from_timestamp(ts, 0))
    }

    /// Check if the claims have expired at `now`.
    pub fn is_expired_at(&self, now: i64) -> bool {
        set(self.expires_at).is_some_and(|exp| now > exp)
    }

    /// Check the time window against `now` (Unix seconds).
    pub fn validate_at(&self, now: i64) -> Result<(), TokenError> {
        if self.is_expired_at(now) {
            return Err(TokenError::Expired);
        }
        if set(self.issued_at).is_some_and(|iat| now < iat) {
            return Err(TokenError::ClaimValidation("token used before issued".to_string()));
        }
        if set(self.not_before).is_some_and(|nbf| now < nbf) {
            return Err(TokenError::ClaimValidation("token is not valid yet".to_string()));
        }
        Ok(())
    }
}

fn set(claim: Option<i64>) -> Option<i64> {
    claim.filter(|&ts| ts != 0)
}

/// NumericDate: any JSON number, floored to whole seconds.
fn numeric_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let Some(number) = Option::<Number>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Some(ts) = number.as_i64() {
        return Ok(Some(ts));
    }
    match number.as_f64() {
        // `as` saturates, so out-of-range values clamp to i64::MIN/MAX
        Some(ts) if ts.is_finite() => Ok(Some(ts.floor() as i64)),
        _ => Err(D::Error::custom(format!("invalid NumericDate `{number}`"))),
    }
}
