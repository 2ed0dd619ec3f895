//! Compact JWT verification against keys from a [`KeyResolver`].
use std::fmt;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};
use tracing::debug;

use crate::services::auth::error::{AuthError, AuthResult};
use crate::services::auth::jwks::{KeyResolver, SUPPORTED_ALG};

/// Decoded payload of an accepted token, exactly as it was signed.
#[derive(Debug, Clone, PartialEq)]
pub struct Claims(Map<String, Value>);

impl Claims {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn subject(&self) -> Option<&str> {
        self.get("sub").and_then(Value::as_str)
    }

}

/// Borrowed view of the three token segments.
struct CompactToken<'a> {
    header: &'a str,
    payload: &'a str,
}

impl<'a> CompactToken<'a> {
    fn parse(token: &'a str) -> AuthResult<Self> {
        let mut segments = token.split('.');
        match (segments.next(), segments.next(), segments.next(), segments.next()) {
            (Some(header), Some(payload), Some(signature), None)
                if !header.is_empty() && !payload.is_empty() && !signature.is_empty() =>
            {
                Ok(Self { header, payload })
            }
            _ => Err(AuthError::malformed("expected three non-empty segments")),
        }
    }
}

fn decode_segment(segment: &str, name: &'static str) -> AuthResult<Map<String, Value>> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|err| AuthError::malformed(format!("{name} is not base64url: {err}")))?;

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(AuthError::malformed(format!("{name} is not a JSON object"))),
        Err(err) => Err(AuthError::malformed(format!("{name} is not JSON: {err}"))),
    }
}

/// Unix-seconds claim. `Ok(None)` when absent, error when present but not an integer.
fn time_claim(payload: &Map<String, Value>, name: &'static str) -> AuthResult<Option<i64>> {
    match payload.get(name) {
        None => Ok(None),
        Some(value) => value
            .as_i64()
            .map(Some)
            .ok_or_else(|| AuthError::malformed(format!("'{name}' is not an integer"))),
    }
}

/// Signature check only; time claims are validated by the caller.
fn verify_signature(token: &str, key: &DecodingKey) -> AuthResult<()> {
    let mut validation = Validation::new(Algorithm::RS256);
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    match jsonwebtoken::decode::<Value>(token, key, &validation) {
        Ok(_) => Ok(()),
        Err(err) => Err(match err.kind() {
            ErrorKind::InvalidSignature | ErrorKind::Base64(_) => AuthError::InvalidSignature,
            ErrorKind::InvalidAlgorithm => AuthError::UnsupportedAlgorithm(err.to_string()),
            _ => AuthError::malformed(err.to_string()),
        }),
    }
}

/// RS256 access-token verifier.
///
/// Steps, in order: segment split, header/payload decode, algorithm allow-list,
/// key lookup by `kid`, signature, then `exp` (and `iat` shape).
#[derive(Clone)]
pub struct TokenVerifier {
    resolver: Arc<dyn KeyResolver>,
    leeway_seconds: u64,
}

impl fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("leeway_seconds", &self.leeway_seconds)
            .finish_non_exhaustive()
    }
}

impl TokenVerifier {
    pub fn new(resolver: Arc<dyn KeyResolver>) -> Self {
        Self {
            resolver,
            leeway_seconds: 0,
        }
    }

    /// Clock-skew allowance for `exp`. Zero unless configured.
    pub fn with_leeway(mut self, leeway_seconds: u64) -> Self {
        self.leeway_seconds = leeway_seconds;
        self
    }

    pub async fn verify(&self, token: &str) -> AuthResult<Claims> {
        self.verify_at(token, Utc::now().timestamp()).await
    }

    /// Verify as of `now` (Unix seconds).
    pub async fn verify_at(&self, token: &str, now: i64) -> AuthResult<Claims> {
        let compact = CompactToken::parse(token)?;
        let header = decode_segment(compact.header, "header")?;
        let payload = decode_segment(compact.payload, "payload")?;

        let alg = match header.get("alg") {
            Some(Value::String(alg)) => alg.as_str(),
            Some(_) => return Err(AuthError::malformed("'alg' is not a string")),
            None => return Err(AuthError::malformed("header has no 'alg'")),
        };
        if alg != SUPPORTED_ALG {
            return Err(AuthError::UnsupportedAlgorithm(alg.to_string()));
        }

        let kid = match header.get("kid") {
            Some(Value::String(kid)) => kid.as_str(),
            Some(_) => return Err(AuthError::malformed("'kid' is not a string")),
            None => return Err(AuthError::malformed("header has no 'kid'")),
        };

        let jwk = self.resolver.resolve(kid).await?;
        let key = jwk.decoding_key()?;
        verify_signature(token, &key)?;

        let exp = time_claim(&payload, "exp")?
            .ok_or_else(|| AuthError::malformed("missing 'exp' claim"))?;
        time_claim(&payload, "iat")?;

        let leeway = i64::try_from(self.leeway_seconds).unwrap_or(i64::MAX);
        if exp.saturating_add(leeway) <= now {
            return Err(AuthError::TokenExpired);
        }

        debug!(kid, "verified access token");
        Ok(Claims(payload))
    }
}
