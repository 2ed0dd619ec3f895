//! Bearer access-token check → `AuthCtx` in request extensions.
//!
//! - `Authorization: Bearer <jwt>` is required, spelled exactly like that.
//!   Anything else is rejected before the verifier runs, so no JWKS fetch happens.
//! - The verifier's failure reason goes to the log; the client always gets the
//!   same 401.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::api::extractors::AuthCtx;
use crate::error::AppError;
use crate::services::auth::AuthError;
use crate::state::AppState;

/// Require bearer authentication on every route of `router`.
///
/// Uses `route_layer`, so unmatched paths still fall through to 404 instead of 401.
///
/// ```ignore
/// let protected = Router::new().route("/entries", get(entries));
/// let protected = middleware::auth::access::apply(protected, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.route_layer(middleware::from_fn_with_state(state, access_middleware))
}

/// Token from `Authorization: Bearer <token>`.
///
/// Scheme is case-sensitive, separated by exactly one space, and the token
/// itself must be non-empty and free of whitespace.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredential)?
        .to_str()
        .map_err(|_| AuthError::MissingCredential)?;

    let token = value
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MissingCredential)?;

    if token.is_empty() || token.chars().any(char::is_whitespace) {
        return Err(AuthError::MissingCredential);
    }

    Ok(token)
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = match bearer_token(req.headers()) {
        Ok(token) => token.to_owned(),
        Err(err) => {
            tracing::warn!(
                kind = err.kind(),
                path = %req.uri().path(),
                "request rejected before token verification"
            );
            return Err(AppError::Unauthorized);
        }
    };

    let claims = match state.auth.verify(&token).await {
        Ok(claims) => claims,
        Err(err) => {
            tracing::warn!(
                kind = err.kind(),
                error = %err,
                path = %req.uri().path(),
                "access token verification failed"
            );
            return Err(AppError::Unauthorized);
        }
    };

    // middleware → extractor
    req.extensions_mut().insert(AuthCtx::new(claims));

    Ok(next.run(req).await)
}
