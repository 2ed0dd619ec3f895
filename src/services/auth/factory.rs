//! Factory: build `TokenVerifier` from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::services::auth::{JwksCache, JwksClient, TokenVerifier};

pub fn build_token_verifier(config: &Config) -> Result<Arc<TokenVerifier>, reqwest::Error> {
    let cache = JwksCache::new(config.jwks_cache_ttl);
    let jwks = JwksClient::new(config.jwks_uri.clone(), config.jwks_fetch_timeout, cache)?;

    tracing::info!(
        jwks_uri = %config.jwks_uri,
        cache_ttl_secs = config.jwks_cache_ttl.as_secs(),
        leeway_secs = config.auth_leeway_seconds,
        "token verifier configured"
    );

    let verifier = TokenVerifier::new(Arc::new(jwks)).with_leeway(config.auth_leeway_seconds);
    Ok(Arc::new(verifier))
}
