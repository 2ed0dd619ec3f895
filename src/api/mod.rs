/*
 * Responsibility
 * - Public surface of the HTTP API (re-export routes())
 */
pub mod extractors;
pub mod handlers;
pub mod render;
mod routes;

pub use routes::routes;
