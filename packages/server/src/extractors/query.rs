use axum::{
    extract::{FromRequestParts, Query, rejection::QueryRejection},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// Query-string extractor that reports bad parameters, such as `?year=x`,
/// as `VALIDATION_ERROR` bodies.
pub struct AppQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for AppQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| AppQuery(value))
            .map_err(|rejection: QueryRejection| {
                tracing::debug!(status = %rejection.status(), "Rejected query string");
                AppError::Validation(format!(
                    "Invalid query parameters: {}",
                    rejection.body_text()
                ))
            })
    }
}
