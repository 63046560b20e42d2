use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub use super::catalog::CatalogEntryResponse;
pub use super::shared::Pagination;
use super::shared::validate_name;

pub const MAX_DESCRIPTION_LENGTH: usize = 500;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateTitleRequest {
    #[schema(example = "Dune")]
    pub name: String,
    #[schema(example = 1965)]
    pub year: i32,
    pub description: Option<String>,
    /// Genre slugs.
    #[schema(example = json!(["sci-fi"]))]
    pub genre: Vec<String>,
    /// Category slug.
    #[schema(example = "book")]
    pub category: String,
}

/// Partial update of a title. `genre`, when present, replaces the whole set.
#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateTitleRequest {
    pub name: Option<String>,
    pub year: Option<i32>,
    pub description: Option<String>,
    pub genre: Option<Vec<String>>,
    pub category: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TitleResponse {
    pub id: i32,
    #[schema(example = "Dune")]
    pub name: String,
    #[schema(example = 1965)]
    pub year: i32,
    /// Average review score, one decimal place; null without reviews.
    #[schema(example = 8.7)]
    pub rating: Option<f64>,
    pub description: Option<String>,
    pub genre: Vec<CatalogEntryResponse>,
    pub category: Option<CatalogEntryResponse>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TitleListResponse {
    pub data: Vec<TitleResponse>,
    pub pagination: Pagination,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TitleListQuery {
    /// Page number (1-based, default 1).
    pub page: Option<u64>,
    /// Items per page (1-100, default 20).
    pub per_page: Option<u64>,
    /// Category slug.
    pub category: Option<String>,
    /// Genre slug.
    pub genre: Option<String>,
    /// Case-insensitive name substring.
    pub name: Option<String>,
    /// Exact release year.
    pub year: Option<i32>,
}

/// A title may not be dated after `current_year`.
pub fn validate_year(year: i32, current_year: i32) -> Result<(), AppError> {
    if year > current_year {
        return Err(AppError::Validation(
            "Year must not be in the future".into(),
        ));
    }
    Ok(())
}

fn validate_description(description: Option<&str>) -> Result<(), AppError> {
    if let Some(d) = description
        && d.chars().count() > MAX_DESCRIPTION_LENGTH
    {
        return Err(AppError::Validation(format!(
            "Description must be at most {MAX_DESCRIPTION_LENGTH} characters"
        )));
    }
    Ok(())
}

pub fn validate_create_title(req: &CreateTitleRequest, current_year: i32) -> Result<(), AppError> {
    validate_name(&req.name)?;
    validate_year(req.year, current_year)?;
    validate_description(req.description.as_deref())?;
    Ok(())
}

pub fn validate_update_title(req: &UpdateTitleRequest, current_year: i32) -> Result<(), AppError> {
    if let Some(ref name) = req.name {
        validate_name(name)?;
    }
    if let Some(year) = req.year {
        validate_year(year, current_year)?;
    }
    validate_description(req.description.as_deref())?;
    Ok(())
}
