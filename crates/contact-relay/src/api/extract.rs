//! Request extractors.

use crate::error::RelayError;
use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use tracing::debug;

/// JSON body extractor whose rejections use the relay error envelope.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelayJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for RelayJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = RelayError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(RelayJson(value)),
            Err(rejection) => {
                debug!(status = %rejection.status(), "Rejected request body");
                Err(RelayError::InvalidBody(rejection.body_text()))
            }
        }
    }
}
