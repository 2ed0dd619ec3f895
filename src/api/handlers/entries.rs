/*
 * Responsibility
 * - GET /entries (row count of `entries`)
 * - Only reachable through the access middleware
 */
use axum::{extract::State, response::Html};

use crate::{
    api::{extractors::AuthCtxExtractor, render},
    error::AppError,
    repos::entry_repo,
    state::AppState,
};

pub async fn entries(
    State(state): State<AppState>,
    AuthCtxExtractor(auth): AuthCtxExtractor,
) -> Result<Html<String>, AppError> {
    let count = entry_repo::count(&state.db).await?;

    tracing::debug!(sub = auth.subject().unwrap_or("-"), count, "counted entries");

    Ok(render::page(&format!("<h1>Entries: {count}</h1>")))
}
