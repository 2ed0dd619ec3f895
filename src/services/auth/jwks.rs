//! JWKS fetch + key lookup.
//!
//! `JwksClient` fetches `{ "keys": [...] }` from the configured URI on demand and
//! keeps the result in an injected [`JwksCache`]. A lookup miss on a fresh cache
//! triggers one refetch so that rotated keys are picked up without waiting for
//! the TTL.
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::DecodingKey;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use url::Url;

use crate::services::auth::error::{AuthError, AuthResult};

/// The only signature algorithm accepted for access tokens.
pub const SUPPORTED_ALG: &str = "RS256";

/// Resolves a signing key by `kid`.
///
/// The verifier only depends on this trait, so tests (and callers that want a
/// per-request key set) can hand it a fixed [`JwkSet`] instead of the network client.
#[async_trait]
pub trait KeyResolver: Send + Sync {
    async fn resolve(&self, kid: &str) -> AuthResult<Jwk>;
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Jwk {
    pub kty: String,
    /// Optional per RFC 7517; keys without one can never be selected.
    #[serde(default)]
    pub kid: Option<String>,
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,
    #[serde(default)]
    pub alg: Option<String>,
    #[serde(default)]
    pub n: Option<String>,
    #[serde(default)]
    pub e: Option<String>,
}

impl Jwk {
    fn label(&self) -> &str {
        self.kid.as_deref().unwrap_or("<no kid>")
    }

    /// Build the RSA verification key for this JWK.
    ///
    /// A key that is not an RSA signing key for RS256 is rejected as
    /// `UnsupportedAlgorithm`: the token asked for RS256, the key says otherwise.
    pub fn decoding_key(&self) -> AuthResult<DecodingKey> {
        if self.kty != "RSA" {
            return Err(AuthError::UnsupportedAlgorithm(format!(
                "key {} has kty {}",
                self.label(),
                self.kty
            )));
        }
        if let Some(alg) = self.alg.as_deref() {
            if alg != SUPPORTED_ALG {
                return Err(AuthError::UnsupportedAlgorithm(format!(
                    "key {} is bound to {alg}",
                    self.label()
                )));
            }
        }
        if let Some(key_use) = self.key_use.as_deref() {
            if key_use != "sig" {
                return Err(AuthError::UnsupportedAlgorithm(format!(
                    "key {} has use {key_use}",
                    self.label()
                )));
            }
        }

        let (Some(n), Some(e)) = (self.n.as_deref(), self.e.as_deref()) else {
            return Err(AuthError::key_set(format!(
                "key {} is missing RSA components",
                self.label()
            )));
        };

        DecodingKey::from_rsa_components(n, e)
            .map_err(|err| AuthError::key_set(format!("key {}: {err}", self.label())))
    }
}

/// Ordered key set as served by the JWKS endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JwkSet {
    pub keys: Vec<Jwk>,
}

impl JwkSet {
    #[cfg(test)]
    pub fn new(keys: Vec<Jwk>) -> Self {
        Self { keys }
    }

    /// First key whose `kid` matches exactly. Keys without a `kid` never match.
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys
            .iter()
            .find(|key| key.kid.as_deref() == Some(kid))
    }

    /// Reject sets we refuse to serve from: empty, or with a `kid` used twice.
    /// Keys without a `kid` are kept and ignored.
    pub fn validate(self) -> AuthResult<Self> {
        if self.keys.is_empty() {
            return Err(AuthError::key_set("key set is empty"));
        }

        let mut seen = HashSet::new();
        for kid in self.keys.iter().filter_map(|key| key.kid.as_deref()) {
            if !seen.insert(kid) {
                return Err(AuthError::key_set(format!("duplicate kid {kid}")));
            }
        }

        Ok(self)
    }
}

#[async_trait]
impl KeyResolver for JwkSet {
    async fn resolve(&self, kid: &str) -> AuthResult<Jwk> {
        self.find(kid)
            .cloned()
            .ok_or_else(|| AuthError::UnknownKey(kid.to_string()))
    }
}

#[derive(Debug, Clone)]
struct CachedKeySet {
    keys: Arc<JwkSet>,
    fetched_at: Instant,
    // bumped on every store, lets a waiter tell whether someone else refreshed
    generation: u64,
}

/// Shared JWKS cache handle.
///
/// Cheap to clone; clones share the same slot. The key set is swapped in whole,
/// so readers never see a partially fetched set. Refreshes go through `refresh`
/// so at most one fetch is in flight per cache.
#[derive(Debug, Clone)]
pub struct JwksCache {
    ttl: Duration,
    slot: Arc<RwLock<Option<CachedKeySet>>>,
    refresh: Arc<Mutex<()>>,
}

impl JwksCache {
    /// `ttl` of zero disables reuse across lookups.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Arc::new(RwLock::new(None)),
            refresh: Arc::new(Mutex::new(())),
        }
    }

    async fn current(&self) -> Option<CachedKeySet> {
        self.slot.read().await.clone()
    }

    fn is_fresh(&self, entry: &CachedKeySet) -> bool {
        entry.fetched_at.elapsed() < self.ttl
    }

    async fn store(&self, keys: JwkSet) -> Arc<JwkSet> {
        let keys = Arc::new(keys);
        let mut slot = self.slot.write().await;
        let generation = slot.as_ref().map_or(1, |entry| entry.generation + 1);
        *slot = Some(CachedKeySet {
            keys: keys.clone(),
            fetched_at: Instant::now(),
            generation,
        });
        keys
    }
}

/// Network-backed [`KeyResolver`].
#[derive(Debug, Clone)]
pub struct JwksClient {
    url: Url,
    http: Client,
    cache: JwksCache,
}

impl JwksClient {
    /// `timeout` bounds each fetch; hitting it surfaces as `KeySetUnavailable`.
    pub fn new(url: Url, timeout: Duration, cache: JwksCache) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(http, url, cache))
    }

    pub fn with_client(http: Client, url: Url, cache: JwksCache) -> Self {
        Self { url, http, cache }
    }

    /// One uncached fetch of the key set.
    pub async fn fetch(&self) -> AuthResult<JwkSet> {
        debug!(url = %self.url, "fetching JWKS");

        let response = self.http.get(self.url.clone()).send().await.map_err(|err| {
            if err.is_timeout() {
                AuthError::key_set(format!("timed out fetching {}", self.url))
            } else {
                AuthError::key_set(err.to_string())
            }
        })?;

        if response.status() != StatusCode::OK {
            return Err(AuthError::key_set(format!(
                "HTTP {} from {}",
                response.status(),
                self.url
            )));
        }

        let body: JwkSet = response
            .json()
            .await
            .map_err(|err| AuthError::key_set(format!("invalid JWKS body: {err}")))?;

        body.validate()
    }

    /// Fetch unless another task stored a newer set since we looked (`seen`).
    async fn refresh_after(&self, seen: Option<u64>) -> AuthResult<Arc<JwkSet>> {
        let _guard = self.cache.refresh.lock().await;

        if let Some(entry) = self.cache.current().await {
            if Some(entry.generation) != seen {
                debug!(generation = entry.generation, "JWKS refreshed by another request");
                return Ok(entry.keys);
            }
        }

        let keys = self.fetch().await?;
        let count = keys.keys.len();
        let keys = self.cache.store(keys).await;
        info!(url = %self.url, key_count = count, "JWKS cache refreshed");
        Ok(keys)
    }
}

#[async_trait]
impl KeyResolver for JwksClient {
    async fn resolve(&self, kid: &str) -> AuthResult<Jwk> {
        let seen = match self.cache.current().await {
            Some(entry) if self.cache.is_fresh(&entry) => {
                if let Some(key) = entry.keys.find(kid) {
                    debug!(kid, "JWKS cache hit");
                    return Ok(key.clone());
                }
                debug!(kid, "kid not in cached JWKS, refetching");
                Some(entry.generation)
            }
            Some(entry) => Some(entry.generation),
            None => None,
        };

        let keys = self.refresh_after(seen).await?;
        match keys.find(kid) {
            Some(key) => Ok(key.clone()),
            None => {
                warn!(kid, "kid not found in JWKS after refresh");
                Err(AuthError::UnknownKey(kid.to_string()))
            }
        }
    }
}
