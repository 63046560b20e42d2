use axum::{Json, extract::State};
use sea_orm::prelude::Expr;
use sea_orm::*;
use tracing::instrument;

use crate::entity::user;
use crate::error::{AppError, ErrorBody, unique_violation};
use crate::extractors::json::AppJson;
use crate::models::auth::{
    SignupRequest, SignupResponse, TokenRequest, TokenResponse, validate_signup_request,
    validate_token_request,
};
use crate::models::user::Role;
use crate::state::AppState;
use crate::utils::code::generate_confirmation_code;
use crate::utils::lookup::find_user_by_username;
use crate::utils::{hash, jwt};

#[utoipa::path(
    post,
    path = "/signup",
    tag = "Auth",
    operation_id = "signup",
    summary = "Register and receive a confirmation code by email",
    description = "Creates a user with role `user` and emails a confirmation code. Calling it again with the same username and email re-sends a fresh code. The email or username of another account is rejected.",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "Confirmation code sent", body = SignupResponse),
        (status = 400, description = "Validation error or already in use (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn signup(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SignupRequest>,
) -> Result<Json<SignupResponse>, AppError> {
    validate_signup_request(&payload)?;

    let by_username = user::Entity::find()
        .filter(user::Column::Username.eq(payload.username.as_str()))
        .one(&state.db)
        .await?;
    let by_email = user::Entity::find()
        .filter(user::Column::Email.eq(payload.email.as_str()))
        .one(&state.db)
        .await?;

    let code = generate_confirmation_code();
    let code_hash = hash::hash_secret(&code)
        .map_err(|e| AppError::Internal(format!("Code hash error: {}", e)))?;

    let user = match (by_username, by_email) {
        (Some(existing), Some(same)) if existing.id == same.id => {
            let mut active: user::ActiveModel = existing.into();
            active.confirmation_code = Set(Some(code_hash));
            active.update(&state.db).await?
        }
        (_, Some(_)) => {
            return Err(AppError::Validation(format!(
                "Email {} is already in use",
                payload.email
            )));
        }
        (Some(_), None) => {
            return Err(AppError::Validation(format!(
                "Username {} is already in use",
                payload.username
            )));
        }
        (None, None) => {
            let new_user = user::ActiveModel {
                username: Set(payload.username.clone()),
                email: Set(payload.email.clone()),
                first_name: Set(String::new()),
                last_name: Set(String::new()),
                bio: Set(String::new()),
                role: Set(Role::User.to_string()),
                is_superuser: Set(false),
                confirmation_code: Set(Some(code_hash)),
                date_joined: Set(chrono::Utc::now()),
                ..Default::default()
            };
            new_user
                .insert(&state.db)
                .await
                .map_err(|e| unique_violation(e, "Username or email is already in use"))?
        }
    };

    state
        .mailer
        .send_confirmation_code(&user.email, &user.username, &code)
        .await?;

    Ok(Json(SignupResponse {
        email: user.email,
        username: user.username,
    }))
}

#[utoipa::path(
    post,
    path = "/token",
    tag = "Auth",
    operation_id = "obtainToken",
    summary = "Exchange a confirmation code for a JWT",
    description = "Returns a bearer token when the code matches the last one sent to the user. A code can be exchanged once.",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR) or wrong code (INVALID_CONFIRMATION_CODE)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn token(
    State(state): State<AppState>,
    AppJson(payload): AppJson<TokenRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    validate_token_request(&payload)?;

    let user = find_user_by_username(&state.db, payload.username.trim()).await?;

    let Some(stored) = user.confirmation_code.as_deref() else {
        return Err(AppError::InvalidConfirmationCode);
    };
    let is_valid = hash::verify_secret(payload.confirmation_code.trim(), stored)
        .map_err(|e| AppError::Internal(format!("Code verify error: {}", e)))?;
    if !is_valid {
        return Err(AppError::InvalidConfirmationCode);
    }

    // Only the request that clears this exact code gets a token.
    let consumed = user::Entity::update_many()
        .col_expr(user::Column::ConfirmationCode, Expr::value(Option::<String>::None))
        .filter(user::Column::Id.eq(user.id))
        .filter(user::Column::ConfirmationCode.eq(stored))
        .exec(&state.db)
        .await?;
    if consumed.rows_affected != 1 {
        return Err(AppError::InvalidConfirmationCode);
    }

    let token = jwt::sign(
        user.id,
        &user.username,
        &state.config.auth.jwt_secret,
        state.config.auth.token_ttl_days,
    )
    .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;

    Ok(Json(TokenResponse { token }))
}
