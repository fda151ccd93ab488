/*
 * Responsibility
 * - /api/data handlers (stand-ins for the protected upstream)
 * - By the time these run, the guard pipeline has authenticated and authorized the caller
 */
use axum::{Json, response::IntoResponse};
use serde_json::json;

use crate::api::extractors::CurrentIdentity;

/// GET /api/data (data:read)
pub async fn read(CurrentIdentity(identity): CurrentIdentity) -> impl IntoResponse {
    Json(json!({
        "message": "Read operation authorized",
        "subject": identity.subject(),
        "data": "Protected data content",
    }))
}

/// POST /api/data (data:write)
pub async fn write(CurrentIdentity(identity): CurrentIdentity) -> impl IntoResponse {
    Json(json!({
        "message": "Write operation authorized",
        "subject": identity.subject(),
        "status": "Data written successfully",
    }))
}

/// DELETE /api/data (admin)
pub async fn delete(CurrentIdentity(identity): CurrentIdentity) -> impl IntoResponse {
    Json(json!({
        "message": "Delete operation authorized",
        "subject": identity.subject(),
        "status": "Data deleted successfully",
    }))
}
