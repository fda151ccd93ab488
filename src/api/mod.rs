/*
 * Responsibility
 * - HTTP surface: routes, handlers, extractors
 * - route_scopes() is the single place protected endpoints declare their scope
 */
pub mod extractors;
pub mod handlers;
mod routes;

pub use routes::{route_scopes, routes};
