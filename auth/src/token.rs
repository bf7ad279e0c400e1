//! Issuing and reading HS256-signed tokens.

use chrono::{DateTime, Duration, Utc};
use error::TokenError;
use hmac::digest::KeyInit;
use hmac::Hmac;
use jwt::{AlgorithmType, Header, JoseHeader, SignWithKey, Token, VerifyWithKey};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Sha256, Sha384, Sha512};

use crate::claims::{StandardClaims, TokenClaims};

type HmacSha256 = Hmac<Sha256>;
type HmacSha384 = Hmac<Sha384>;
type HmacSha512 = Hmac<Sha512>;

/// Algorithm used for every issued token.
pub const SIGNING_ALGORITHM: AlgorithmType = AlgorithmType::Hs256;

/// Header of an incoming token.
///
/// `alg` is kept as the raw string so that algorithms the codec does not
/// know are still reported as unexpected rather than malformed.
#[derive(Debug, Deserialize)]
struct IncomingHeader {
    alg: String,
}

impl IncomingHeader {
    fn hmac_algorithm(&self) -> Option<AlgorithmType> {
        match self.alg.as_str() {
            "HS256" => Some(AlgorithmType::Hs256),
            "HS384" => Some(AlgorithmType::Hs384),
            "HS512" => Some(AlgorithmType::Hs512),
            _ => None,
        }
    }
}

impl JoseHeader for IncomingHeader {
    // Non-HMAC headers are rejected before verification; `None` matches no key.
    fn algorithm_type(&self) -> AlgorithmType {
        self.hmac_algorithm().unwrap_or(AlgorithmType::None)
    }
}

/// A freshly signed token and the standard claims embedded in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// Compact `header.claims.signature` string
    pub token: String,
    /// Registered claims written into the token body
    pub standard_claims: StandardClaims,
}

/// Sign `claims` into a new token.
///
/// With `ttl`, the token expires at `now + ttl`; without, it carries no
/// `exp` and never expires.
pub fn issue<C>(secret: &str, claims: &C, ttl: Option<Duration>) -> Result<IssuedToken, TokenError>
where
    C: Serialize + ?Sized,
{
    issue_at(secret, claims, ttl, Utc::now())
}

/// Verify `token` and return its custom claims as a JSON object.
pub fn read(secret: &str, token: &str) -> Result<Map<String, Value>, TokenError> {
    match read_custom_claims(secret, token, Utc::now())? {
        Value::Object(map) => Ok(map),
        other => {
            tracing::debug!(kind = json_kind(&other), "custom claims are not an object");
            Err(TokenError::InvalidClaims)
        }
    }
}

/// Verify `token` and deserialize its custom claims into `C`.
pub fn read_as<C: DeserializeOwned>(secret: &str, token: &str) -> Result<C, TokenError> {
    let custom = read_custom_claims(secret, token, Utc::now())?;
    serde_json::from_value(custom).map_err(|e| {
        tracing::debug!("Custom claims do not match the requested type: {}", e);
        TokenError::InvalidClaims
    })
}

pub(crate) fn issue_at<C>(
    secret: &str,
    claims: &C,
    ttl: Option<Duration>,
    now: DateTime<Utc>,
) -> Result<IssuedToken, TokenError>
where
    C: Serialize + ?Sized,
{
    let key = hmac_key::<HmacSha256>(signing_secret(secret)?)?;

    let standard_claims = match ttl {
        Some(ttl) => {
            let expires_at = now.checked_add_signed(ttl).ok_or_else(|| {
                TokenError::Encoding("expiration is out of range".to_string())
            })?;
            StandardClaims::expiring_at(expires_at.timestamp())
        }
        None => StandardClaims::default(),
    };

    let header = Header {
        algorithm: SIGNING_ALGORITHM,
        type_: Some(jwt::header::HeaderType::JsonWebToken),
        ..Header::default()
    };
    let body = TokenClaims {
        custom_claims: claims,
        standard: standard_claims,
    };

    let signed = Token::new(header, body).sign_with_key(&key).map_err(|e| {
        tracing::debug!("Failed to encode JWT: {}", e);
        TokenError::Encoding(e.to_string())
    })?;

    tracing::trace!(expires_at = ?standard_claims.expires_at, "issued token");

    Ok(IssuedToken {
        token: signed.as_str().to_string(),
        standard_claims,
    })
}

/// Parse, check the algorithm, verify the signature and time window, then
/// hand back the raw `custom_claims` value.
pub(crate) fn read_custom_claims(
    secret: &str,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Value, TokenError> {
    let secret = signing_secret(secret)?;

    let unverified: Token<IncomingHeader, TokenClaims<Option<Value>>, _> =
        Token::parse_unverified(token).map_err(|e| {
            tracing::debug!("Failed to parse JWT: {}", e);
            TokenError::Malformed(e.to_string())
        })?;

    let algorithm = unverified.header().hmac_algorithm();
    let verified = match algorithm {
        Some(AlgorithmType::Hs384) => {
            unverified.verify_with_key(&hmac_key::<HmacSha384>(secret)?)
        }
        Some(AlgorithmType::Hs512) => {
            unverified.verify_with_key(&hmac_key::<HmacSha512>(secret)?)
        }
        Some(_) => unverified.verify_with_key(&hmac_key::<HmacSha256>(secret)?),
        None => {
            let alg = unverified.header().alg.clone();
            tracing::debug!(algorithm = %alg, "rejected non-HMAC token");
            return Err(TokenError::UnexpectedAlgorithm(alg));
        }
    }
    .map_err(|e| {
        tracing::debug!("Failed to verify JWT: {}", e);
        match e {
            jwt::Error::InvalidSignature | jwt::Error::RustCryptoMac(_) => {
                TokenError::InvalidSignature
            }
            other => TokenError::Malformed(other.to_string()),
        }
    })?;

    let claims = verified.claims();
    claims.standard.validate_at(now.timestamp()).inspect_err(|e| {
        tracing::debug!("Token claims rejected: {}", e);
    })?;

    claims.custom_claims.clone().ok_or_else(|| {
        tracing::debug!("Token has no custom claims");
        TokenError::InvalidClaims
    })
}

fn signing_secret(secret: &str) -> Result<&[u8], TokenError> {
    if secret.is_empty() {
        return Err(TokenError::InvalidKey("secret must be non-empty".to_string()));
    }
    Ok(secret.as_bytes())
}

fn hmac_key<K: KeyInit>(secret: &[u8]) -> Result<K, TokenError> {
    K::new_from_slice(secret).map_err(|e| {
        tracing::debug!("Failed to create HMAC key: {}", e);
        TokenError::InvalidKey(e.to_string())
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SECRET: &str = "s3cr3t";

    fn at(ts: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(ts, 0).unwrap()
    }

    #[test]
    fn test_issue_read_roundtrip() {
        let claims = json!({"role": "admin", "id": 7});
        let issued = issue(SECRET, &claims, None).expect("Failed to issue");

        let decoded = read(SECRET, &issued.token).expect("Failed to read");
        assert_eq!(Value::Object(decoded), claims);
    }

    #[test]
    fn test_issue_embeds_expiration() {
        let now = at(1_700_000_000);
        let issued = issue_at(SECRET, &json!({}), Some(Duration::hours(1)), now).unwrap();
        assert_eq!(issued.standard_claims.expires_at, Some(1_700_003_600));
    }

    #[test]
    fn test_issue_without_ttl_has_no_expiration() {
        let issued = issue(SECRET, &json!({"a": 1}), None).unwrap();
        assert_eq!(issued.standard_claims, StandardClaims::default());
        assert!(issued.standard_claims.expires_at_utc().is_none());
    }

    #[test]
    fn test_expiration_enforced_against_clock() {
        let issued = issue_at(SECRET, &json!({}), Some(Duration::seconds(60)), at(1_000)).unwrap();

        assert!(read_custom_claims(SECRET, &issued.token, at(1_060)).is_ok());
        assert_eq!(
            read_custom_claims(SECRET, &issued.token, at(1_061)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_negative_ttl_is_already_expired() {
        let issued = issue(SECRET, &json!({"role": "admin"}), Some(Duration::seconds(-1))).unwrap();
        let err = read(SECRET, &issued.token).unwrap_err();
        assert!(err.is_expired());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issued = issue(SECRET, &json!({"role": "admin"}), None).unwrap();
        assert_eq!(read("other", &issued.token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(matches!(
            issue("", &json!({}), None),
            Err(TokenError::InvalidKey(_))
        ));
        assert!(matches!(read("", "a.b.c"), Err(TokenError::InvalidKey(_))));
    }

    #[test]
    fn test_ttl_overflow_is_encoding_error() {
        let result = issue(SECRET, &json!({}), Some(Duration::MAX));
        assert!(matches!(result, Err(TokenError::Encoding(_))));
    }

    #[test]
    fn test_unserializable_claims_is_encoding_error() {
        let mut claims = std::collections::HashMap::new();
        claims.insert(vec![1u8, 2], "non-string key");
        assert!(matches!(
            issue(SECRET, &claims, None),
            Err(TokenError::Encoding(_))
        ));
    }

    #[test]
    fn test_non_object_claims_fail_read_but_not_read_as() {
        let issued = issue(SECRET, &vec!["a", "b"], None).unwrap();
        assert_eq!(read(SECRET, &issued.token), Err(TokenError::InvalidClaims));

        let list: Vec<String> = read_as(SECRET, &issued.token).unwrap();
        assert_eq!(list, vec!["a", "b"]);
    }

    #[test]
    fn test_read_as_typed_claims() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Session {
            user_id: String,
            admin: bool,
        }

        let session = Session {
            user_id: "user123".to_string(),
            admin: true,
        };
        let issued = issue(SECRET, &session, Some(Duration::minutes(5))).unwrap();

        let decoded: Session = read_as(SECRET, &issued.token).unwrap();
        assert_eq!(decoded, session);

        let mismatch = read_as::<Vec<u32>>(SECRET, &issued.token);
        assert_eq!(mismatch, Err(TokenError::InvalidClaims));
    }

    #[test]
    fn test_garbage_is_malformed() {
        for token in ["", "not-a-jwt", "a.b", "a.b.c", "....", "eyJ.eyJ.sig"] {
            let err = read(SECRET, token).unwrap_err();
            assert!(matches!(err, TokenError::Malformed(_)), "{token}: {err:?}");
        }
    }

    #[test]
    fn test_incoming_header_algorithms() {
        let header: IncomingHeader = serde_json::from_value(json!({"alg": "HS512"})).unwrap();
        assert_eq!(header.algorithm_type(), AlgorithmType::Hs512);

        for alg in ["none", "RS256", "EdDSA", "hs256"] {
            let header: IncomingHeader = serde_json::from_value(json!({"alg": alg})).unwrap();
            assert!(header.hmac_algorithm().is_none(), "{alg}");
            assert_eq!(header.algorithm_type(), AlgorithmType::None);
        }
    }
}
