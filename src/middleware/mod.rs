/*
 * Responsibility
 * - middleware の公開インターフェース
 * - auth: per-route guard pipeline (authenticate -> authorize)
 * - http: request id / tracing / limits for every route
 */
pub mod auth;
pub mod http;
