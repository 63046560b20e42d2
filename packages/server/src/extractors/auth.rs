use axum::{extract::FromRequestParts, http::request::Parts};
use sea_orm::EntityTrait;

use crate::entity::user;
use crate::error::AppError;
use crate::models::user::Role;
use crate::state::AppState;
use crate::utils::jwt;

/// Authenticated user extracted from the `Authorization: Bearer <token>` header.
///
/// Add this as a handler parameter to require authentication. The user row is
/// reloaded on every request, so role changes and deletions apply immediately.
/// Permission checks happen via the `require_*` methods in the handler body.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i32,
    pub username: String,
    pub role: Role,
    pub is_superuser: bool,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.is_superuser || self.role == Role::Admin
    }

    pub fn is_moderator(&self) -> bool {
        self.role == Role::Moderator
    }

    /// Returns `Ok(())` for admins and superusers, `Err(PermissionDenied)` otherwise.
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }

    /// Authors may edit their own content; moderators and admins may edit anyone's.
    pub fn can_modify_content_of(&self, author_id: i32) -> bool {
        self.user_id == author_id || self.is_moderator() || self.is_admin()
    }

    pub fn require_author_or_staff(&self, author_id: i32) -> Result<(), AppError> {
        if self.can_modify_content_of(author_id) {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::TokenMissing)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::TokenInvalid)?;

        let claims =
            jwt::verify(token, &state.config.auth.jwt_secret).map_err(|_| AppError::TokenInvalid)?;

        let user = user::Entity::find_by_id(claims.uid)
            .one(&state.db)
            .await?
            .ok_or(AppError::TokenInvalid)?;

        Ok(AuthUser {
            user_id: user.id,
            role: user.role.parse()?,
            username: user.username,
            is_superuser: user.is_superuser,
        })
    }
}
