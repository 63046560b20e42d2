use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{genre, title_genre};
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
    tag = "Genres",
    operation_id = "listGenres",
    summary = "List genres",
    description = "Paginated list of genres ordered by name, with optional case-insensitive name search. Public.",
    params(CatalogListQuery),
    responses(
        (status = 200, description = "List of genres", body = CatalogListResponse),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_genres(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<CatalogListQuery>,
) -> Result<Json<CatalogListResponse>, AppError> {
    let response = catalog::list_entries::<genre::Entity, _>(
        &state.db,
        genre::Column::Name,
        genre::Column::Id,
        &query,
    )
    .await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Genres",
    operation_id = "createGenre",
    summary = "Create a genre",
    description = "Admin only. The slug must be unique.",
    request_body = CreateCatalogEntryRequest,
    responses(
        (status = 201, description = "Genre created", body = CatalogEntryResponse),
        (status = 400, description = "Validation error or duplicate slug (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(slug = %payload.slug))]
pub async fn create_genre(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateCatalogEntryRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;
    validate_create_entry(&payload)?;

    catalog::ensure_slug_free::<genre::Entity, _>(
        &state.db,
        genre::Column::Slug,
        &payload.slug,
        "Genre",
    )
    .await?;

    let model = genre::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        slug: Set(payload.slug),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| unique_violation(e, "Genre with this slug already exists"))?;

    Ok((StatusCode::CREATED, Json(CatalogEntryResponse::from(model))))
}

#[utoipa::path(
    delete,
    path = "/{slug}",
    tag = "Genres",
    operation_id = "deleteGenre",
    summary = "Delete a genre",
    description = "Admin only. The genre is detached from every title.",
    params(("slug" = String, Path, description = "Genre slug")),
    responses(
        (status = 204, description = "Genre deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Genre not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(slug))]
pub async fn delete_genre(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(slug): AppPath<String>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;

    let txn = state.db.begin().await?;

    let existing = genre::Entity::find()
        .filter(genre::Column::Slug.eq(slug.as_str()))
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Genre not found".into()))?;

    title_genre::Entity::delete_many()
        .filter(title_genre::Column::GenreId.eq(existing.id))
        .exec(&txn)
        .await?;

    genre::Entity::delete_by_id(existing.id).exec(&txn).await?;

    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}
