use axum::{
    extract::{FromRequestParts, Path, rejection::PathRejection},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// Path extractor for ids and slugs. A segment that does not parse, such as
/// `/titles/abc`, becomes a `VALIDATION_ERROR` body.
pub struct AppPath<T>(pub T);

impl<S, T> FromRequestParts<S> for AppPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(AppPath(value)),
            Err(rejection) => Err(path_error(rejection)),
        }
    }
}

fn path_error(rejection: PathRejection) -> AppError {
    if rejection.status().is_server_error() {
        return AppError::Internal(format!("Path extraction failed: {}", rejection.body_text()));
    }
    tracing::debug!(status = %rejection.status(), "Rejected path parameters");
    AppError::Validation(format!("Invalid path parameter: {}", rejection.body_text()))
}
