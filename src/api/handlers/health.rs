/*
 * Responsibility
 * - GET /health (疎通用)
 * - Not guarded: no route-scope entry, no bearer token needed
 */
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}
