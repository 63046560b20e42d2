use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::prelude::Expr;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{category, title};
use crate::error::{AppError, ErrorBody, unique_violation};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::extractors::path::AppPath;
use crate::extractors::query::AppQuery;
use crate::models::catalog::*;
use crate::state::AppState;
use crate::utils::catalog;

#[utoipa::path(
    get,
    path = "/",
    tag = "Categories",
    operation_id = "listCategories",
    summary = "List categories",
    description = "Paginated list of categories ordered by name, with optional case-insensitive name search. Public.",
    params(CatalogListQuery),
    responses(
        (status = 200, description = "List of categories", body = CatalogListResponse),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_categories(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<CatalogListQuery>,
) -> Result<Json<CatalogListResponse>, AppError> {
    let response = catalog::list_entries::<category::Entity, _>(
        &state.db,
        category::Column::Name,
        category::Column::Id,
        &query,
    )
    .await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Categories",
    operation_id = "createCategory",
    summary = "Create a category",
    description = "Admin only. The slug must be unique.",
    request_body = CreateCatalogEntryRequest,
    responses(
        (status = 201, description = "Category created", body = CatalogEntryResponse),
        (status = 400, description = "Validation error or duplicate slug (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(slug = %payload.slug))]
pub async fn create_category(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateCatalogEntryRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;
    validate_create_entry(&payload)?;

    catalog::ensure_slug_free::<category::Entity, _>(
        &state.db,
        category::Column::Slug,
        &payload.slug,
        "Category",
    )
    .await?;

    let model = category::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        slug: Set(payload.slug),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| unique_violation(e, "Category with this slug already exists"))?;

    Ok((StatusCode::CREATED, Json(CatalogEntryResponse::from(model))))
}

#[utoipa::path(
    delete,
    path = "/{slug}",
    tag = "Categories",
    operation_id = "deleteCategory",
    summary = "Delete a category",
    description = "Admin only. Titles in the category are kept with no category.",
    params(("slug" = String, Path, description = "Category slug")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(slug))]
pub async fn delete_category(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(slug): AppPath<String>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;

    let txn = state.db.begin().await?;

    let existing = category::Entity::find()
        .filter(category::Column::Slug.eq(slug.as_str()))
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".into()))?;

    title::Entity::update_many()
        .col_expr(title::Column::CategoryId, Expr::value(Option::<i32>::None))
        .filter(title::Column::CategoryId.eq(existing.id))
        .exec(&txn)
        .await?;

    category::Entity::delete_by_id(existing.id).exec(&txn).await?;

    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}
