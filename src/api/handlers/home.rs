/*
 * Responsibility
 * - GET / (greeting page)
 */
use axum::{extract::State, response::Html};

use crate::{api::render, state::AppState};

pub async fn home(State(state): State<AppState>) -> Html<String> {
    render::page(&format!("<h1>Hello!{}</h1>", render::escape(&state.fullname)))
}
