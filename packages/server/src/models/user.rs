use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::entity::user;
use crate::error::AppError;

pub use super::shared::Pagination;

/// Username reserved for the `/users/me` endpoint.
pub const RESERVED_USERNAME: &str = "me";

/// Access role of a user. Superuser status is tracked separately.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Moderator,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "moderator" => Ok(Role::Moderator),
            "admin" => Ok(Role::Admin),
            other => Err(AppError::Internal(format!("Unknown role '{other}'"))),
        }
    }
}

/// Username: 1-150 chars of letters, digits and `@ . + - _`, never `me`.
pub fn validate_username(username: &str) -> Result<(), AppError> {
    if username.is_empty() || username.chars().count() > 150 {
        return Err(AppError::Validation(
            "Username must be 1-150 characters".into(),
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '@' | '.' | '+' | '-'))
    {
        return Err(AppError::Validation(
            "Username may contain only letters, digits and @/./+/-/_".into(),
        ));
    }
    if username == RESERVED_USERNAME {
        return Err(AppError::Validation("Username 'me' is not allowed".into()));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), AppError> {
    if email.is_empty() || email.chars().count() > 254 {
        return Err(AppError::Validation("Email must be 1-254 characters".into()));
    }
    if email.parse::<lettre::Address>().is_err() {
        return Err(AppError::Validation("Enter a valid email address".into()));
    }
    Ok(())
}

fn validate_person_name(value: Option<&str>, field: &str) -> Result<(), AppError> {
    if let Some(v) = value
        && v.chars().count() > 150
    {
        return Err(AppError::Validation(format!(
            "{field} must be at most 150 characters"
        )));
    }
    Ok(())
}

/// Public profile of a user.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    #[schema(example = "alice")]
    pub username: String,
    #[schema(example = "alice@example.com")]
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    #[schema(example = "user")]
    pub role: String,
}

impl From<user::Model> for UserResponse {
    fn from(m: user::Model) -> Self {
        Self {
            username: m.username,
            email: m.email,
            first_name: m.first_name,
            last_name: m.last_name,
            bio: m.bio,
            role: m.role,
        }
    }
}

/// Request body for creating a user as an administrator.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateUserRequest {
    #[schema(example = "alice")]
    pub username: String,
    #[schema(example = "alice@example.com")]
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    /// Defaults to `user`.
    pub role: Option<Role>,
}

/// Partial update of a user. Absent fields are left untouched.
#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    /// Ignored on `/users/me`.
    pub role: Option<Role>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UserListResponse {
    pub data: Vec<UserResponse>,
    pub pagination: Pagination,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserListQuery {
    /// Page number (1-based, default 1).
    pub page: Option<u64>,
    /// Items per page (1-100, default 20).
    pub per_page: Option<u64>,
    /// Case-insensitive username substring.
    pub search: Option<String>,
}

pub fn validate_create_user(req: &CreateUserRequest) -> Result<(), AppError> {
    validate_username(&req.username)?;
    validate_email(&req.email)?;
    validate_person_name(req.first_name.as_deref(), "First name")?;
    validate_person_name(req.last_name.as_deref(), "Last name")?;
    Ok(())
}

pub fn validate_update_user(req: &UpdateUserRequest) -> Result<(), AppError> {
    if let Some(ref username) = req.username {
        validate_username(username)?;
    }
    if let Some(ref email) = req.email {
        validate_email(email)?;
    }
    validate_person_name(req.first_name.as_deref(), "First name")?;
    validate_person_name(req.last_name.as_deref(), "Last name")?;
    Ok(())
}
