use std::collections::{HashMap, HashSet};

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Datelike;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr, Query as SeaQuery};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{category, comment, genre, review, title, title_genre};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::extractors::path::AppPath;
use crate::extractors::query::AppQuery;
use crate::models::shared::{escape_like, page_bounds};
use crate::models::title::*;
use crate::state::AppState;
use crate::utils::lookup::find_title;

fn current_year() -> i32 {
    chrono::Utc::now().year()
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Titles",
    operation_id = "listTitles",
    summary = "List titles",
    description = "Paginated list of titles, newest first. Filters: `category` and `genre` by slug, `name` as a case-insensitive substring, `year` exact. Public.",
    params(TitleListQuery),
    responses(
        (status = 200, description = "List of titles", body = TitleListResponse),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_titles(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<TitleListQuery>,
) -> Result<Json<TitleListResponse>, AppError> {
    let (page, per_page) = page_bounds(query.page, query.per_page);
    let mut select = title::Entity::find();

    if let Some(ref slug) = query.category {
        select = select.filter(
            title::Column::CategoryId.in_subquery(
                SeaQuery::select()
                    .column(category::Column::Id)
                    .from(category::Entity)
                    .and_where(category::Column::Slug.eq(slug.as_str()))
                    .to_owned(),
            ),
        );
    }

    if let Some(ref slug) = query.genre {
        select = select.filter(
            title::Column::Id.in_subquery(
                SeaQuery::select()
                    .column(title_genre::Column::TitleId)
                    .from(title_genre::Entity)
                    .and_where(
                        title_genre::Column::GenreId.in_subquery(
                            SeaQuery::select()
                                .column(genre::Column::Id)
                                .from(genre::Entity)
                                .and_where(genre::Column::Slug.eq(slug.as_str()))
                                .to_owned(),
                        ),
                    )
                    .to_owned(),
            ),
        );
    }

    if let Some(ref name) = query.name {
        let term = escape_like(name.trim());
        if !term.is_empty() {
            select = select.filter(
                Expr::expr(Func::lower(Expr::col(title::Column::Name)))
                    .like(LikeExpr::new(format!("%{}%", term.to_lowercase())).escape('\\')),
            );
        }
    }

    if let Some(year) = query.year {
        select = select.filter(title::Column::Year.eq(year));
    }

    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;

    let titles = select
        .order_by_desc(title::Column::Id)
        .offset(Some((page - 1) * per_page))
        .limit(Some(per_page))
        .all(&state.db)
        .await?;

    let data = load_title_responses(&state.db, titles).await?;

    Ok(Json(TitleListResponse {
        data,
        pagination: Pagination::new(page, per_page, total),
    }))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Titles",
    operation_id = "createTitle",
    summary = "Create a title",
    description = "Admin only. `genre` is a list of genre slugs and `category` a category slug; both must exist. The year may not be in the future.",
    request_body = CreateTitleRequest,
    responses(
        (status = 201, description = "Title created", body = TitleResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(name = %payload.name))]
pub async fn create_title(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateTitleRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;
    validate_create_title(&payload, current_year())?;

    let txn = state.db.begin().await?;

    let category = resolve_category(&txn, &payload.category).await?;
    let genres = resolve_genres(&txn, &payload.genre).await?;

    let model = title::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        year: Set(payload.year),
        description: Set(payload.description),
        rating: Set(None),
        category_id: Set(Some(category.id)),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    link_genres(&txn, model.id, &genres).await?;
    txn.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(title_response(model, genres, Some(category))),
    ))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Titles",
    operation_id = "getTitle",
    summary = "Get a title by ID",
    description = "Public.",
    params(("id" = i32, Path, description = "Title ID")),
    responses(
        (status = 200, description = "Title details", body = TitleResponse),
        (status = 404, description = "Title not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_title(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<Json<TitleResponse>, AppError> {
    let model = find_title(&state.db, id).await?;
    let response = load_title_responses(&state.db, vec![model])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal("Title vanished while loading".into()))?;
    Ok(Json(response))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Titles",
    operation_id = "updateTitle",
    summary = "Update a title",
    description = "Partially updates a title. When present, `genre` replaces the whole genre set. Admin only.",
    params(("id" = i32, Path, description = "Title ID")),
    request_body = UpdateTitleRequest,
    responses(
        (status = 200, description = "Title updated", body = TitleResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Title not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_title(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<UpdateTitleRequest>,
) -> Result<Json<TitleResponse>, AppError> {
    auth_user.require_admin()?;
    validate_update_title(&payload, current_year())?;

    let txn = state.db.begin().await?;
    let existing = find_title(&txn, id).await?;

    let category_id = match payload.category {
        Some(ref slug) => Some(resolve_category(&txn, slug).await?.id),
        None => None,
    };

    if let Some(ref slugs) = payload.genre {
        let genres = resolve_genres(&txn, slugs).await?;
        title_genre::Entity::delete_many()
            .filter(title_genre::Column::TitleId.eq(id))
            .exec(&txn)
            .await?;
        link_genres(&txn, id, &genres).await?;
    }

    let has_column_changes = payload.name.is_some()
        || payload.year.is_some()
        || payload.description.is_some()
        || category_id.is_some();

    let model = if has_column_changes {
        let mut active: title::ActiveModel = existing.into();
        if let Some(ref name) = payload.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(year) = payload.year {
            active.year = Set(year);
        }
        if let Some(description) = payload.description {
            active.description = Set(Some(description));
        }
        if let Some(category_id) = category_id {
            active.category_id = Set(Some(category_id));
        }
        active.update(&txn).await?
    } else {
        existing
    };

    txn.commit().await?;

    let response = load_title_responses(&state.db, vec![model])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal("Title vanished while loading".into()))?;
    Ok(Json(response))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Titles",
    operation_id = "deleteTitle",
    summary = "Delete a title",
    description = "Deletes a title with its reviews, their comments and its genre links. Admin only.",
    params(("id" = i32, Path, description = "Title ID")),
    responses(
        (status = 204, description = "Title deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Title not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_title(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;

    let txn = state.db.begin().await?;
    find_title(&txn, id).await?;

    comment::Entity::delete_many()
        .filter(
            comment::Column::ReviewId.in_subquery(
                SeaQuery::select()
                    .column(review::Column::Id)
                    .from(review::Entity)
                    .and_where(review::Column::TitleId.eq(id))
                    .to_owned(),
            ),
        )
        .exec(&txn)
        .await?;

    review::Entity::delete_many()
        .filter(review::Column::TitleId.eq(id))
        .exec(&txn)
        .await?;
    title_genre::Entity::delete_many()
        .filter(title_genre::Column::TitleId.eq(id))
        .exec(&txn)
        .await?;
    title::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Resolve a category slug from a request body; unknown slugs are a client error.
async fn resolve_category<C: ConnectionTrait>(
    db: &C,
    slug: &str,
) -> Result<category::Model, AppError> {
    category::Entity::find()
        .filter(category::Column::Slug.eq(slug))
        .one(db)
        .await?
        .ok_or_else(|| AppError::Validation(format!("Category '{slug}' does not exist")))
}

/// Resolve genre slugs, dropping duplicates; any unknown slug is a client error.
async fn resolve_genres<C: ConnectionTrait>(
    db: &C,
    slugs: &[String],
) -> Result<Vec<genre::Model>, AppError> {
    let mut seen = HashSet::new();
    let wanted: Vec<&str> = slugs
        .iter()
        .map(String::as_str)
        .filter(|s| seen.insert(*s))
        .collect();
    if wanted.is_empty() {
        return Ok(Vec::new());
    }

    let found = genre::Entity::find()
        .filter(genre::Column::Slug.is_in(wanted.iter().copied()))
        .order_by_asc(genre::Column::Name)
        .all(db)
        .await?;

    if let Some(missing) = wanted
        .iter()
        .find(|slug| !found.iter().any(|g| g.slug == **slug))
    {
        return Err(AppError::Validation(format!(
            "Genre '{missing}' does not exist"
        )));
    }

    Ok(found)
}

async fn link_genres<C: ConnectionTrait>(
    db: &C,
    title_id: i32,
    genres: &[genre::Model],
) -> Result<(), AppError> {
    if genres.is_empty() {
        return Ok(());
    }

    let rows = genres.iter().map(|g| title_genre::ActiveModel {
        title_id: Set(title_id),
        genre_id: Set(g.id),
    });
    title_genre::Entity::insert_many(rows)
        .exec_without_returning(db)
        .await?;
    Ok(())
}

fn title_response(
    model: title::Model,
    genres: Vec<genre::Model>,
    category: Option<category::Model>,
) -> TitleResponse {
    TitleResponse {
        id: model.id,
        name: model.name,
        year: model.year,
        rating: model.rating,
        description: model.description,
        genre: genres.into_iter().map(CatalogEntryResponse::from).collect(),
        category: category.map(CatalogEntryResponse::from),
    }
}

/// Attach genres and categories to a page of titles, preserving order.
async fn load_title_responses<C: ConnectionTrait>(
    db: &C,
    titles: Vec<title::Model>,
) -> Result<Vec<TitleResponse>, AppError> {
    if titles.is_empty() {
        return Ok(Vec::new());
    }

    let title_ids: Vec<i32> = titles.iter().map(|t| t.id).collect();
    let links = title_genre::Entity::find()
        .filter(title_genre::Column::TitleId.is_in(title_ids))
        .all(db)
        .await?;

    let genre_ids: HashSet<i32> = links.iter().map(|l| l.genre_id).collect();
    let genres: HashMap<i32, genre::Model> = if genre_ids.is_empty() {
        HashMap::new()
    } else {
        genre::Entity::find()
            .filter(genre::Column::Id.is_in(genre_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|g| (g.id, g))
            .collect()
    };

    let category_ids: HashSet<i32> = titles.iter().filter_map(|t| t.category_id).collect();
    let categories: HashMap<i32, category::Model> = if category_ids.is_empty() {
        HashMap::new()
    } else {
        category::Entity::find()
            .filter(category::Column::Id.is_in(category_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect()
    };

    let mut genres_by_title: HashMap<i32, Vec<genre::Model>> = HashMap::new();
    for link in &links {
        if let Some(g) = genres.get(&link.genre_id) {
            genres_by_title
                .entry(link.title_id)
                .or_default()
                .push(g.clone());
        }
    }

    Ok(titles
        .into_iter()
        .map(|t| {
            let mut title_genres = genres_by_title.remove(&t.id).unwrap_or_default();
            title_genres.sort_by(|a, b| a.name.cmp(&b.name));
            let category = t.category_id.and_then(|id| categories.get(&id).cloned());
            title_response(t, title_genres, category)
        })
        .collect())
}
