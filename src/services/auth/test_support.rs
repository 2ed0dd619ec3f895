//! RSA key material and token builders shared by the auth tests.
//!
//! Key generation is slow in debug builds, so each key is generated once per
//! test binary.
use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use rsa::RsaPrivateKey;
use rsa::pkcs1::{EncodeRsaPrivateKey, LineEnding};
use rsa::rand_core::OsRng;
use rsa::traits::PublicKeyParts;
use serde_json::{Value, json};

use crate::services::auth::jwks::Jwk;

static TEST_KEY: LazyLock<TestKey> = LazyLock::new(|| TestKey::generate("test-key-1"));
static OTHER_KEY: LazyLock<TestKey> = LazyLock::new(|| TestKey::generate("test-key-2"));

pub(crate) fn test_key() -> &'static TestKey {
    &TEST_KEY
}

pub(crate) fn other_key() -> &'static TestKey {
    &OTHER_KEY
}

pub(crate) struct TestKey {
    pub kid: String,
    pub jwk: Jwk,
    encoding: EncodingKey,
}

impl TestKey {
    fn generate(kid: &str) -> Self {
        let mut rng = OsRng;
        let private_key = RsaPrivateKey::new(&mut rng, 2048).expect("key generation");
        let public_key = private_key.to_public_key();

        let private_pem = private_key
            .to_pkcs1_pem(LineEnding::LF)
            .expect("private pem");
        let encoding = EncodingKey::from_rsa_pem(private_pem.as_bytes()).expect("encoding key");

        let jwk = Jwk {
            kty: "RSA".to_string(),
            kid: Some(kid.to_string()),
            key_use: Some("sig".to_string()),
            alg: Some("RS256".to_string()),
            n: Some(URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be())),
            e: Some(URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be())),
        };

        Self {
            kid: kid.to_string(),
            jwk,
            encoding,
        }
    }

    /// Public JWK as the JWKS endpoint would serve it.
    pub fn jwk_json(&self) -> Value {
        self.jwk_json_as(&self.kid)
    }

    pub fn jwk_json_as(&self, kid: &str) -> Value {
        json!({
            "kty": self.jwk.kty,
            "use": self.jwk.key_use,
            "alg": self.jwk.alg,
            "kid": kid,
            "n": self.jwk.n,
            "e": self.jwk.e,
        })
    }

    /// Same key under a different `kid`.
    pub fn jwk_as(&self, kid: &str) -> Jwk {
        let mut jwk = self.jwk.clone();
        jwk.kid = Some(kid.to_string());
        jwk
    }

    pub fn sign(&self, claims: &Value) -> String {
        self.sign_as(&self.kid, claims)
    }

    pub fn sign_as(&self, kid: &str, claims: &Value) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.typ = Some("JWT".to_string());
        header.kid = Some(kid.to_string());
        jsonwebtoken::encode(&header, claims, &self.encoding).expect("sign token")
    }
}

pub(crate) fn now() -> i64 {
    Utc::now().timestamp()
}

/// `{sub, iat, exp}` with `exp = now + ttl_seconds`.
pub(crate) fn claims(sub: &str, ttl_seconds: i64) -> Value {
    let now = now();
    json!({
        "sub": sub,
        "iat": now,
        "exp": now + ttl_seconds,
    })
}

pub(crate) fn b64_json(value: &Value) -> String {
    URL_SAFE_NO_PAD.encode(serde_json::to_vec(value).expect("serialize json"))
}
