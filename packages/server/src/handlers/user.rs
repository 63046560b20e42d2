use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr, Query as SeaQuery};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{comment, review, user};
use crate::error::{AppError, ErrorBody, unique_violation};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::extractors::path::AppPath;
use crate::extractors::query::AppQuery;
use crate::models::shared::{escape_like, page_bounds};
use crate::models::user::*;
use crate::state::AppState;
use crate::utils::lookup::find_user_by_username;
use crate::utils::rating::recompute_title_rating;

#[utoipa::path(
    get,
    path = "/",
    tag = "Users",
    operation_id = "listUsers",
    summary = "List users",
    description = "Paginated list of users ordered by username, with optional case-insensitive username search. Admin only.",
    params(UserListQuery),
    responses(
        (status = 200, description = "List of users", body = UserListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_users(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<UserListQuery>,
) -> Result<Json<UserListResponse>, AppError> {
    auth_user.require_admin()?;

    let (page, per_page) = page_bounds(query.page, query.per_page);
    let mut select = user::Entity::find();

    if let Some(ref search) = query.search {
        let term = escape_like(search.trim());
        if !term.is_empty() {
            select = select.filter(
                Expr::expr(Func::lower(Expr::col(user::Column::Username)))
                    .like(LikeExpr::new(format!("%{}%", term.to_lowercase())).escape('\\')),
            );
        }
    }

    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;

    let data = select
        .order_by_asc(user::Column::Username)
        .offset(Some((page - 1) * per_page))
        .limit(Some(per_page))
        .all(&state.db)
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    Ok(Json(UserListResponse {
        data,
        pagination: Pagination::new(page, per_page, total),
    }))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Users",
    operation_id = "createUser",
    summary = "Create a user",
    description = "Creates a user directly, bypassing signup. Role defaults to `user`. Admin only.",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Validation error or already in use (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(username = %payload.username))]
pub async fn create_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;
    validate_create_user(&payload)?;

    ensure_username_free(&state.db, &payload.username, None).await?;
    ensure_email_free(&state.db, &payload.email, None).await?;

    let new_user = user::ActiveModel {
        username: Set(payload.username),
        email: Set(payload.email),
        first_name: Set(payload.first_name.unwrap_or_default()),
        last_name: Set(payload.last_name.unwrap_or_default()),
        bio: Set(payload.bio.unwrap_or_default()),
        role: Set(payload.role.unwrap_or_default().to_string()),
        is_superuser: Set(false),
        confirmation_code: Set(None),
        date_joined: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let model = new_user
        .insert(&state.db)
        .await
        .map_err(|e| unique_violation(e, "Username or email is already in use"))?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/{username}",
    tag = "Users",
    operation_id = "getUser",
    summary = "Get a user by username",
    description = "Admin only.",
    params(("username" = String, Path, description = "Username")),
    responses(
        (status = 200, description = "User details", body = UserResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(username))]
pub async fn get_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(username): AppPath<String>,
) -> Result<Json<UserResponse>, AppError> {
    auth_user.require_admin()?;

    let model = find_user_by_username(&state.db, &username).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    patch,
    path = "/{username}",
    tag = "Users",
    operation_id = "updateUser",
    summary = "Update a user",
    description = "Partially updates a user, including the role. Admin only.",
    params(("username" = String, Path, description = "Username")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Validation error or already in use (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(username))]
pub async fn update_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(username): AppPath<String>,
    AppJson(payload): AppJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    auth_user.require_admin()?;
    validate_update_user(&payload)?;

    let existing = find_user_by_username(&state.db, &username).await?;
    let model = apply_user_update(&state.db, existing, payload, true).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{username}",
    tag = "Users",
    operation_id = "deleteUser",
    summary = "Delete a user",
    description = "Deletes a user together with their reviews and comments; ratings of the affected titles are recomputed. Admin only.",
    params(("username" = String, Path, description = "Username")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(username))]
pub async fn delete_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(username): AppPath<String>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;

    let txn = state.db.begin().await?;
    let target = find_user_by_username(&txn, &username).await?;

    comment::Entity::delete_many()
        .filter(
            Condition::any()
                .add(comment::Column::AuthorId.eq(target.id))
                .add(
                    comment::Column::ReviewId.in_subquery(
                        SeaQuery::select()
                            .column(review::Column::Id)
                            .from(review::Entity)
                            .and_where(review::Column::AuthorId.eq(target.id))
                            .to_owned(),
                    ),
                ),
        )
        .exec(&txn)
        .await?;

    let mut title_ids: Vec<i32> = review::Entity::find()
        .filter(review::Column::AuthorId.eq(target.id))
        .select_only()
        .column(review::Column::TitleId)
        .into_tuple()
        .all(&txn)
        .await?;
    title_ids.sort_unstable();
    title_ids.dedup();

    review::Entity::delete_many()
        .filter(review::Column::AuthorId.eq(target.id))
        .exec(&txn)
        .await?;

    for title_id in title_ids {
        recompute_title_rating(&txn, title_id).await?;
    }

    user::Entity::delete_by_id(target.id).exec(&txn).await?;
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "Users",
    operation_id = "getMe",
    summary = "Get the current user",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_me(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, AppError> {
    let model = find_user_by_id(&state.db, auth_user.user_id).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    patch,
    path = "/me",
    tag = "Users",
    operation_id = "updateMe",
    summary = "Update the current user",
    description = "Partially updates the caller's own profile. The `role` field is ignored.",
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Validation error or already in use (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_me(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    validate_update_user(&payload)?;

    let existing = find_user_by_id(&state.db, auth_user.user_id).await?;
    let model = apply_user_update(&state.db, existing, payload, false).await?;
    Ok(Json(model.into()))
}

async fn find_user_by_id<C: ConnectionTrait>(db: &C, id: i32) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

async fn ensure_username_free<C: ConnectionTrait>(
    db: &C,
    username: &str,
    except_id: Option<i32>,
) -> Result<(), AppError> {
    let mut select = user::Entity::find().filter(user::Column::Username.eq(username));
    if let Some(id) = except_id {
        select = select.filter(user::Column::Id.ne(id));
    }
    if select.count(db).await? > 0 {
        return Err(AppError::Validation(format!(
            "Username {username} is already in use"
        )));
    }
    Ok(())
}

async fn ensure_email_free<C: ConnectionTrait>(
    db: &C,
    email: &str,
    except_id: Option<i32>,
) -> Result<(), AppError> {
    let mut select = user::Entity::find().filter(user::Column::Email.eq(email));
    if let Some(id) = except_id {
        select = select.filter(user::Column::Id.ne(id));
    }
    if select.count(db).await? > 0 {
        return Err(AppError::Validation(format!(
            "Email {email} is already in use"
        )));
    }
    Ok(())
}

/// Apply PATCH semantics to `existing`. `allow_role` is false for self-service updates.
async fn apply_user_update<C: ConnectionTrait>(
    db: &C,
    existing: user::Model,
    mut payload: UpdateUserRequest,
    allow_role: bool,
) -> Result<user::Model, AppError> {
    if !allow_role {
        payload.role = None;
    }
    if payload == UpdateUserRequest::default() {
        return Ok(existing);
    }

    if let Some(ref username) = payload.username {
        ensure_username_free(db, username, Some(existing.id)).await?;
    }
    if let Some(ref email) = payload.email {
        ensure_email_free(db, email, Some(existing.id)).await?;
    }

    let mut active: user::ActiveModel = existing.into();

    if let Some(username) = payload.username {
        active.username = Set(username);
    }
    if let Some(email) = payload.email {
        active.email = Set(email);
    }
    if let Some(first_name) = payload.first_name {
        active.first_name = Set(first_name);
    }
    if let Some(last_name) = payload.last_name {
        active.last_name = Set(last_name);
    }
    if let Some(bio) = payload.bio {
        active.bio = Set(bio);
    }
    if let Some(role) = payload.role {
        active.role = Set(role.to_string());
    }

    active
        .update(db)
        .await
        .map_err(|e| unique_violation(e, "Username or email is already in use"))
}
