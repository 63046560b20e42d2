use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;

use crate::entity::comment;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::extractors::path::AppPath;
use crate::extractors::query::AppQuery;
use crate::models::review::*;
use crate::models::shared::page_bounds;
use crate::state::AppState;
use crate::utils::lookup::{find_comment, find_review, find_title, username_of, usernames_by_id};

/// Resolve the `title_id`/`review_id` pair, 404 if either is missing or they don't match.
async fn find_parent_review<C: ConnectionTrait>(
    db: &C,
    title_id: i32,
    review_id: i32,
) -> Result<(), AppError> {
    find_title(db, title_id).await?;
    find_review(db, title_id, review_id).await?;
    Ok(())
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Comments",
    operation_id = "listComments",
    summary = "List comments on a review",
    description = "Paginated list of a review's comments, newest first. Public.",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("review_id" = i32, Path, description = "Review ID"),
        PageQuery,
    ),
    responses(
        (status = 200, description = "List of comments", body = CommentListResponse),
        (status = 404, description = "Title or review not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query), fields(title_id, review_id))]
pub async fn list_comments(
    State(state): State<AppState>,
    AppPath((title_id, review_id)): AppPath<(i32, i32)>,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<Json<CommentListResponse>, AppError> {
    find_parent_review(&state.db, title_id, review_id).await?;
    let (page, per_page) = page_bounds(query.page, query.per_page);

    let select = comment::Entity::find().filter(comment::Column::ReviewId.eq(review_id));

    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;

    let comments = select
        .order_by_desc(comment::Column::Id)
        .offset(Some((page - 1) * per_page))
        .limit(Some(per_page))
        .all(&state.db)
        .await?;

    let authors = usernames_by_id(&state.db, comments.iter().map(|c| c.author_id)).await?;
    let data = comments
        .into_iter()
        .map(|c| {
            let author = authors.get(&c.author_id).cloned().unwrap_or_default();
            CommentResponse::new(c, author)
        })
        .collect();

    Ok(Json(CommentListResponse {
        data,
        pagination: Pagination::new(page, per_page, total),
    }))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Comments",
    operation_id = "createComment",
    summary = "Comment on a review",
    description = "Any authenticated user may comment.",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("review_id" = i32, Path, description = "Review ID"),
    ),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment created", body = CommentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Title or review not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(title_id, review_id, user_id = auth_user.user_id))]
pub async fn create_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath((title_id, review_id)): AppPath<(i32, i32)>,
    AppJson(payload): AppJson<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_comment(&payload)?;
    find_parent_review(&state.db, title_id, review_id).await?;

    let model = comment::ActiveModel {
        text: Set(payload.text),
        review_id: Set(review_id),
        author_id: Set(auth_user.user_id),
        pub_date: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(CommentResponse::new(model, auth_user.username)),
    ))
}

#[utoipa::path(
    get,
    path = "/{comment_id}",
    tag = "Comments",
    operation_id = "getComment",
    summary = "Get a comment",
    description = "Public. The comment must belong to the review, and the review to the title.",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("review_id" = i32, Path, description = "Review ID"),
        ("comment_id" = i32, Path, description = "Comment ID"),
    ),
    responses(
        (status = 200, description = "Comment details", body = CommentResponse),
        (status = 404, description = "Title, review or comment not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(title_id, review_id, comment_id))]
pub async fn get_comment(
    State(state): State<AppState>,
    AppPath((title_id, review_id, comment_id)): AppPath<(i32, i32, i32)>,
) -> Result<Json<CommentResponse>, AppError> {
    find_parent_review(&state.db, title_id, review_id).await?;
    let model = find_comment(&state.db, review_id, comment_id).await?;
    let author = username_of(&state.db, model.author_id).await?;
    Ok(Json(CommentResponse::new(model, author)))
}

#[utoipa::path(
    patch,
    path = "/{comment_id}",
    tag = "Comments",
    operation_id = "updateComment",
    summary = "Update a comment",
    description = "Allowed for the author, moderators and admins.",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("review_id" = i32, Path, description = "Review ID"),
        ("comment_id" = i32, Path, description = "Comment ID"),
    ),
    request_body = UpdateCommentRequest,
    responses(
        (status = 200, description = "Comment updated", body = CommentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Title, review or comment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(title_id, review_id, comment_id))]
pub async fn update_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath((title_id, review_id, comment_id)): AppPath<(i32, i32, i32)>,
    AppJson(payload): AppJson<UpdateCommentRequest>,
) -> Result<Json<CommentResponse>, AppError> {
    validate_update_comment(&payload)?;
    find_parent_review(&state.db, title_id, review_id).await?;
    let existing = find_comment(&state.db, review_id, comment_id).await?;
    auth_user.require_author_or_staff(existing.author_id)?;

    let model = match payload.text {
        Some(text) => {
            let mut active: comment::ActiveModel = existing.into();
            active.text = Set(text);
            active.update(&state.db).await?
        }
        None => existing,
    };

    let author = username_of(&state.db, model.author_id).await?;
    Ok(Json(CommentResponse::new(model, author)))
}

#[utoipa::path(
    delete,
    path = "/{comment_id}",
    tag = "Comments",
    operation_id = "deleteComment",
    summary = "Delete a comment",
    description = "Allowed for the author, moderators and admins.",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("review_id" = i32, Path, description = "Review ID"),
        ("comment_id" = i32, Path, description = "Comment ID"),
    ),
    responses(
        (status = 204, description = "Comment deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Title, review or comment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(title_id, review_id, comment_id))]
pub async fn delete_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath((title_id, review_id, comment_id)): AppPath<(i32, i32, i32)>,
) -> Result<impl IntoResponse, AppError> {
    find_parent_review(&state.db, title_id, review_id).await?;
    let existing = find_comment(&state.db, review_id, comment_id).await?;
    auth_user.require_author_or_staff(existing.author_id)?;

    comment::Entity::delete_by_id(comment_id)
        .exec(&state.db)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
