/*
 * Responsibility
 * - URL structure of the app
 * - Public: /, /health
 * - Bearer-protected: /entries (access middleware via route_layer)
 */
use axum::{Router, routing::get};

use crate::api::handlers::{entries::entries, health::health, home::home};
use crate::middleware;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new().route("/entries", get(entries));
    let protected = middleware::auth::access::apply(protected, state);

    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .merge(protected)
}
