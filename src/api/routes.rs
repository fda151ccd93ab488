/*
 * Responsibility
 * - URL 構造を定義 (/health, /api/data)
 * - Declare the required scope of every protected endpoint (route_scopes)
 * - Attach the guard pipeline per method route; a protected route without a
 *   declared scope fails startup
 */
use axum::{
    Router,
    http::Method,
    routing::{delete, get, post},
};

use crate::api::handlers::{data, health::health};
use crate::config::ConfigError;
use crate::middleware::auth::protect;
use crate::services::auth::RouteScopeMap;
use crate::state::AppState;

const DATA_PATH: &str = "/api/data";

pub fn route_scopes() -> Result<RouteScopeMap, ConfigError> {
    RouteScopeMap::builder()
        .protect(Method::GET, DATA_PATH, "data:read")
        .protect(Method::POST, DATA_PATH, "data:write")
        .protect(Method::DELETE, DATA_PATH, "admin")
        .build()
}

pub fn routes(state: &AppState) -> Result<Router<AppState>, ConfigError> {
    let data_routes = protect(get(data::read), state, Method::GET, DATA_PATH)?
        .merge(protect(post(data::write), state, Method::POST, DATA_PATH)?)
        .merge(protect(delete(data::delete), state, Method::DELETE, DATA_PATH)?);

    Ok(Router::new()
        .route("/health", get(health))
        .route(DATA_PATH, data_routes))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use axum::response::Response;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::app::build_router;
    use crate::services::auth::audit::Decision;
    use crate::test_support::{self, RecordingAuditSink};

    fn gateway() -> (Router, RecordingAuditSink) {
        let audit = RecordingAuditSink::default();
        let state = test_support::state(audit.clone());
        let router = build_router(state, &test_support::config()).unwrap();
        (router, audit)
    }

    fn request(method: Method, authorization: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(DATA_PATH);
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn bearer(token: &str) -> String {
        format!("Bearer {token}")
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_needs_no_token() {
        let (router, _) = gateway();

        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn missing_header_is_401_with_uniform_body() {
        let (router, audit) = gateway();

        let response = router.oneshot(request(Method::GET, None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            json_body(response).await,
            json!({"error": "unauthorized", "message": "Authorization header is required"})
        );
        assert!(audit.records().is_empty());
    }

    #[tokio::test]
    async fn basic_scheme_is_401() {
        let (router, _) = gateway();

        let response = router
            .oneshot(request(Method::GET, Some("Basic abc123")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["error"], "unauthorized");
        assert!(!body["message"].as_str().unwrap().contains("abc123"));
    }

    #[tokio::test]
    async fn foreign_key_is_401_invalid_signature() {
        let (router, _) = gateway();
        let token = test_support::sign_with(
            jsonwebtoken::Algorithm::HS256,
            b"wrong-secret-key",
            &test_support::claims("data:read", chrono::Utc::now().timestamp() + 3600),
        );

        let response = router
            .oneshot(request(Method::GET, Some(&bearer(&token))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            json_body(response).await,
            json!({"error": "unauthorized", "message": "Invalid token signature"})
        );
    }

    #[tokio::test]
    async fn expired_token_is_401_without_the_timestamp() {
        let (router, _) = gateway();
        let exp = chrono::Utc::now().timestamp() - 3600;
        let token = test_support::token_expiring_at("data:read", exp);

        let response = router
            .oneshot(request(Method::GET, Some(&bearer(&token))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(
            body,
            json!({"error": "unauthorized", "message": "Token has expired"})
        );
        assert!(!body.to_string().contains(&exp.to_string()));
    }

    #[tokio::test]
    async fn read_scope_cannot_write() {
        let (router, audit) = gateway();
        let token = test_support::token("data:read");

        let response = router
            .oneshot(request(Method::POST, Some(&bearer(&token))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            json_body(response).await,
            json!({"error": "forbidden", "message": "Missing required scope: data:write"})
        );

        let records = audit.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].outcome, Decision::Deny);
        assert_eq!(records[0].method, "POST");
        assert_eq!(records[0].route, DATA_PATH);
        assert_eq!(records[0].required_scope, "data:write");
    }

    #[tokio::test]
    async fn read_scope_reaches_the_read_handler() {
        let (router, audit) = gateway();
        let token = test_support::token("data:read");

        let response = router
            .oneshot(request(Method::GET, Some(&bearer(&token))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["subject"], test_support::SUBJECT);
        assert_eq!(body["message"], "Read operation authorized");

        let records = audit.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].outcome, Decision::Allow);
    }

    #[tokio::test]
    async fn delete_requires_admin() {
        let (router, _) = gateway();

        let denied = router
            .clone()
            .oneshot(request(
                Method::DELETE,
                Some(&bearer(&test_support::token("data:read data:write"))),
            ))
            .await
            .unwrap();
        assert_eq!(denied.status(), StatusCode::FORBIDDEN);

        let allowed = router
            .oneshot(request(
                Method::DELETE,
                Some(&bearer(&test_support::token("admin"))),
            ))
            .await
            .unwrap();
        assert_eq!(allowed.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn rejected_requests_never_reach_the_handler() {
        let audit = RecordingAuditSink::default();
        let state = test_support::state(audit);
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        let handler = get(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                "reached"
            }
        });
        let router: Router = Router::new()
            .route(
                DATA_PATH,
                protect(handler, &state, Method::GET, DATA_PATH).unwrap(),
            )
            .with_state(state);

        for authorization in [
            None,
            Some("Basic abc123".to_string()),
            Some("Bearer ".to_string()),
            Some(bearer("not-a-jwt")),
            Some(bearer(&test_support::token("data:write"))),
        ] {
            let response = router
                .clone()
                .oneshot(request(Method::GET, authorization.as_deref()))
                .await
                .unwrap();
            assert!(response.status().is_client_error());
        }
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        let response = router
            .oneshot(request(
                Method::GET,
                Some(&bearer(&test_support::token("data:read"))),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn identity_extractor_on_unguarded_route_is_401() {
        let state = test_support::state(RecordingAuditSink::default());
        let router: Router = Router::new()
            .route(DATA_PATH, get(data::read))
            .with_state(state);

        let response = router.oneshot(request(Method::GET, None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            json_body(response).await,
            json!({"error": "unauthorized", "message": "Authentication required"})
        );
    }

    #[test]
    fn protecting_an_undeclared_route_fails_startup() {
        let state = test_support::state(RecordingAuditSink::default());

        let err = protect(get(data::read), &state, Method::PUT, DATA_PATH).unwrap_err();

        assert!(matches!(err, ConfigError::Route(_)));
    }

    #[test]
    fn every_data_method_has_a_scope() {
        let scopes = route_scopes().unwrap();

        assert_eq!(scopes.len(), 3);
        assert_eq!(
            scopes
                .required_scope(&Method::DELETE, DATA_PATH)
                .unwrap()
                .as_str(),
            "admin"
        );
        assert!(scopes.required_scope(&Method::GET, "/health").is_none());
    }
}
