//! Categories and genres share one shape: a display name plus a unique slug.

use serde::{Deserialize, Serialize};

use crate::entity::{category, genre};
use crate::error::AppError;

pub use super::shared::Pagination;
use super::shared::validate_name;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateCatalogEntryRequest {
    #[schema(example = "Fantasy")]
    pub name: String,
    #[schema(example = "fantasy")]
    pub slug: String,
}

#[derive(Serialize, Clone, Debug, PartialEq, utoipa::ToSchema)]
pub struct CatalogEntryResponse {
    #[schema(example = "Fantasy")]
    pub name: String,
    #[schema(example = "fantasy")]
    pub slug: String,
}

impl From<category::Model> for CatalogEntryResponse {
    fn from(m: category::Model) -> Self {
        Self {
            name: m.name,
            slug: m.slug,
        }
    }
}

impl From<genre::Model> for CatalogEntryResponse {
    fn from(m: genre::Model) -> Self {
        Self {
            name: m.name,
            slug: m.slug,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CatalogListResponse {
    pub data: Vec<CatalogEntryResponse>,
    pub pagination: Pagination,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CatalogListQuery {
    /// Page number (1-based, default 1).
    pub page: Option<u64>,
    /// Items per page (1-100, default 20).
    pub per_page: Option<u64>,
    /// Case-insensitive name substring.
    pub search: Option<String>,
}

/// Slug: 1-50 letters, digits, hyphens or underscores (Unicode letters allowed).
pub fn validate_slug(slug: &str) -> Result<(), AppError> {
    if slug.is_empty() || slug.chars().count() > 50 {
        return Err(AppError::Validation("Slug must be 1-50 characters".into()));
    }
    if !slug
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(AppError::Validation(
            "Slug may contain only letters, digits, hyphens and underscores".into(),
        ));
    }
    Ok(())
}

pub fn validate_create_entry(req: &CreateCatalogEntryRequest) -> Result<(), AppError> {
    validate_name(&req.name)?;
    validate_slug(&req.slug)
}
