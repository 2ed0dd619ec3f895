/*
 * Responsibility
 * - The "authenticated context" type handlers see
 * - The access middleware verifies the token and stores this in request extensions
 *
 * Notes
 * - Token parsing / signature checks live in services::auth, not here
 */
use crate::services::auth::Claims;

/// Context attached to a request that passed bearer authentication.
#[derive(Debug, Clone)]
pub struct AuthCtx {
    pub claims: Claims,
}

impl AuthCtx {
    pub fn new(claims: Claims) -> Self {
        Self { claims }
    }

    pub fn subject(&self) -> Option<&str> {
        self.claims.subject()
    }
}
