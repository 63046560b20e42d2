use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{comment, review};
use crate::error::AppError;

pub use super::shared::Pagination;
use super::shared::validate_text;

pub const MIN_SCORE: i32 = 1;
pub const MAX_SCORE: i32 = 10;

pub fn validate_score(score: i32) -> Result<(), AppError> {
    if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
        return Err(AppError::Validation(format!(
            "Score must be {MIN_SCORE}-{MAX_SCORE}"
        )));
    }
    Ok(())
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateReviewRequest {
    #[schema(example = "A classic.")]
    pub text: String,
    #[schema(example = 9)]
    pub score: i32,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateReviewRequest {
    pub text: Option<String>,
    pub score: Option<i32>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ReviewResponse {
    pub id: i32,
    /// Author's username.
    #[schema(example = "alice")]
    pub author: String,
    pub text: String,
    #[schema(example = 9)]
    pub score: i32,
    pub pub_date: DateTime<Utc>,
}

impl ReviewResponse {
    pub fn new(m: review::Model, author: String) -> Self {
        Self {
            id: m.id,
            author,
            text: m.text,
            score: m.score,
            pub_date: m.pub_date,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ReviewListResponse {
    pub data: Vec<ReviewResponse>,
    pub pagination: Pagination,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateCommentRequest {
    #[schema(example = "Agreed.")]
    pub text: String,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateCommentRequest {
    pub text: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CommentResponse {
    pub id: i32,
    /// Author's username.
    #[schema(example = "alice")]
    pub author: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
}

impl CommentResponse {
    pub fn new(m: comment::Model, author: String) -> Self {
        Self {
            id: m.id,
            author,
            text: m.text,
            pub_date: m.pub_date,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CommentListResponse {
    pub data: Vec<CommentResponse>,
    pub pagination: Pagination,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Page number (1-based, default 1).
    pub page: Option<u64>,
    /// Items per page (1-100, default 20).
    pub per_page: Option<u64>,
}

pub fn validate_create_review(req: &CreateReviewRequest) -> Result<(), AppError> {
    validate_text(&req.text)?;
    validate_score(req.score)
}

pub fn validate_update_review(req: &UpdateReviewRequest) -> Result<(), AppError> {
    if let Some(ref text) = req.text {
        validate_text(text)?;
    }
    if let Some(score) = req.score {
        validate_score(score)?;
    }
    Ok(())
}

pub fn validate_create_comment(req: &CreateCommentRequest) -> Result<(), AppError> {
    validate_text(&req.text)
}

pub fn validate_update_comment(req: &UpdateCommentRequest) -> Result<(), AppError> {
    if let Some(ref text) = req.text {
        validate_text(text)?;
    }
    Ok(())
}
