/*
 * Responsibility
 * - Shared context bound to the Router (AppState)
 *   - db: PgPool, auth: TokenVerifier, fullname for the greeting
 * - Cloned per request (everything inside is Arc / cheap to clone)
 */
use std::sync::Arc;

use crate::services::auth::TokenVerifier;

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub auth: Arc<TokenVerifier>,
    pub fullname: Arc<str>,
}

impl AppState {
    pub fn new(db: sqlx::PgPool, auth: Arc<TokenVerifier>, fullname: impl Into<Arc<str>>) -> Self {
        Self {
            db,
            auth,
            fullname: fullname.into(),
        }
    }
}
