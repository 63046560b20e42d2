use crate::error::AppError;
use serde::{Deserialize, Serialize};

use super::user::{validate_email, validate_username};

/// Request body for signup. Also used to re-request a code for an existing
/// account, in which case both fields must match that account.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct SignupRequest {
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[schema(example = "alice")]
    pub username: String,
}

pub fn validate_signup_request(payload: &SignupRequest) -> Result<(), AppError> {
    validate_username(&payload.username)?;
    validate_email(&payload.email)?;
    Ok(())
}

/// Echo of the accepted signup data.
#[derive(Serialize, utoipa::ToSchema)]
pub struct SignupResponse {
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[schema(example = "alice")]
    pub username: String,
}

/// Request body for exchanging a confirmation code for a token.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct TokenRequest {
    #[schema(example = "alice")]
    pub username: String,
    #[schema(example = "Xy7QpL2mZa9B")]
    pub confirmation_code: String,
}

pub fn validate_token_request(payload: &TokenRequest) -> Result<(), AppError> {
    if payload.username.trim().is_empty() {
        return Err(AppError::Validation("Username must not be empty".into()));
    }
    if payload.confirmation_code.trim().is_empty() {
        return Err(AppError::Validation(
            "Confirmation code must not be empty".into(),
        ));
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TokenResponse {
    /// JWT bearer token.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
}
