use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::services::auth::Identity;

/// Handler で、 Identity を受け取るための extractor
/// The guard middleware must have inserted the Identity into the request extensions.
/// On an unguarded route it is absent and the request is rejected with the generic 401.
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub Identity);

impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(CurrentIdentity)
            .ok_or_else(|| {
                tracing::error!(
                    endpoint = parts.uri.path(),
                    "handler requested an identity on an unguarded route"
                );
                AppError::unauthorized("Authentication required")
            })
    }
}
