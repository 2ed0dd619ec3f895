/*
 * Responsibility
 * - Services shared by handlers and middleware (auth)
 */
pub mod auth;
