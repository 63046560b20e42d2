use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{comment, review};
use crate::error::{AppError, ErrorBody, unique_violation};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::extractors::path::AppPath;
use crate::extractors::query::AppQuery;
use crate::models::review::*;
use crate::models::shared::page_bounds;
use crate::state::AppState;
use crate::utils::lookup::{find_review, find_title, username_of, usernames_by_id};
use crate::utils::rating::recompute_title_rating;

const DUPLICATE_REVIEW: &str = "You have already reviewed this title";

#[utoipa::path(
    get,
    path = "/",
    tag = "Reviews",
    operation_id = "listReviews",
    summary = "List reviews of a title",
    description = "Paginated list of a title's reviews, newest first. Public.",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        PageQuery,
    ),
    responses(
        (status = 200, description = "List of reviews", body = ReviewListResponse),
        (status = 404, description = "Title not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query), fields(title_id))]
pub async fn list_reviews(
    State(state): State<AppState>,
    AppPath(title_id): AppPath<i32>,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<Json<ReviewListResponse>, AppError> {
    find_title(&state.db, title_id).await?;
    let (page, per_page) = page_bounds(query.page, query.per_page);

    let select = review::Entity::find().filter(review::Column::TitleId.eq(title_id));

    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;

    let reviews = select
        .order_by_desc(review::Column::Id)
        .offset(Some((page - 1) * per_page))
        .limit(Some(per_page))
        .all(&state.db)
        .await?;

    let authors = usernames_by_id(&state.db, reviews.iter().map(|r| r.author_id)).await?;
    let data = reviews
        .into_iter()
        .map(|r| {
            let author = authors.get(&r.author_id).cloned().unwrap_or_default();
            ReviewResponse::new(r, author)
        })
        .collect();

    Ok(Json(ReviewListResponse {
        data,
        pagination: Pagination::new(page, per_page, total),
    }))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Reviews",
    operation_id = "createReview",
    summary = "Review a title",
    description = "Any authenticated user may review a title once. The title's rating is recalculated.",
    params(("title_id" = i32, Path, description = "Title ID")),
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review created", body = ReviewResponse),
        (status = 400, description = "Validation error or second review (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Title not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(title_id, user_id = auth_user.user_id))]
pub async fn create_review(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(title_id): AppPath<i32>,
    AppJson(payload): AppJson<CreateReviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_review(&payload)?;

    let txn = state.db.begin().await?;
    find_title(&txn, title_id).await?;

    let existing = review::Entity::find()
        .filter(review::Column::TitleId.eq(title_id))
        .filter(review::Column::AuthorId.eq(auth_user.user_id))
        .count(&txn)
        .await?;
    if existing > 0 {
        return Err(AppError::Validation(DUPLICATE_REVIEW.into()));
    }

    let model = review::ActiveModel {
        text: Set(payload.text),
        score: Set(payload.score),
        title_id: Set(title_id),
        author_id: Set(auth_user.user_id),
        pub_date: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| unique_violation(e, DUPLICATE_REVIEW))?;

    recompute_title_rating(&txn, title_id).await?;
    txn.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(ReviewResponse::new(model, auth_user.username)),
    ))
}

#[utoipa::path(
    get,
    path = "/{review_id}",
    tag = "Reviews",
    operation_id = "getReview",
    summary = "Get a review",
    description = "Public. The review must belong to the title in the path.",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("review_id" = i32, Path, description = "Review ID"),
    ),
    responses(
        (status = 200, description = "Review details", body = ReviewResponse),
        (status = 404, description = "Title or review not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(title_id, review_id))]
pub async fn get_review(
    State(state): State<AppState>,
    AppPath((title_id, review_id)): AppPath<(i32, i32)>,
) -> Result<Json<ReviewResponse>, AppError> {
    find_title(&state.db, title_id).await?;
    let model = find_review(&state.db, title_id, review_id).await?;
    let author = username_of(&state.db, model.author_id).await?;
    Ok(Json(ReviewResponse::new(model, author)))
}

#[utoipa::path(
    patch,
    path = "/{review_id}",
    tag = "Reviews",
    operation_id = "updateReview",
    summary = "Update a review",
    description = "Allowed for the author, moderators and admins. A score change recalculates the title's rating.",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("review_id" = i32, Path, description = "Review ID"),
    ),
    request_body = UpdateReviewRequest,
    responses(
        (status = 200, description = "Review updated", body = ReviewResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Title or review not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(title_id, review_id))]
pub async fn update_review(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath((title_id, review_id)): AppPath<(i32, i32)>,
    AppJson(payload): AppJson<UpdateReviewRequest>,
) -> Result<Json<ReviewResponse>, AppError> {
    validate_update_review(&payload)?;

    let txn = state.db.begin().await?;
    find_title(&txn, title_id).await?;
    let existing = find_review(&txn, title_id, review_id).await?;
    auth_user.require_author_or_staff(existing.author_id)?;

    if payload == UpdateReviewRequest::default() {
        txn.commit().await?;
        let author = username_of(&state.db, existing.author_id).await?;
        return Ok(Json(ReviewResponse::new(existing, author)));
    }

    let rescore = payload.score.is_some_and(|s| s != existing.score);
    let mut active: review::ActiveModel = existing.into();
    if let Some(text) = payload.text {
        active.text = Set(text);
    }
    if let Some(score) = payload.score {
        active.score = Set(score);
    }
    let model = active.update(&txn).await?;

    if rescore {
        recompute_title_rating(&txn, title_id).await?;
    }
    txn.commit().await?;

    let author = username_of(&state.db, model.author_id).await?;
    Ok(Json(ReviewResponse::new(model, author)))
}

#[utoipa::path(
    delete,
    path = "/{review_id}",
    tag = "Reviews",
    operation_id = "deleteReview",
    summary = "Delete a review",
    description = "Allowed for the author, moderators and admins. Removes the review's comments and recalculates the title's rating.",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("review_id" = i32, Path, description = "Review ID"),
    ),
    responses(
        (status = 204, description = "Review deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Title or review not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(title_id, review_id))]
pub async fn delete_review(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath((title_id, review_id)): AppPath<(i32, i32)>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;
    find_title(&txn, title_id).await?;
    let existing = find_review(&txn, title_id, review_id).await?;
    auth_user.require_author_or_staff(existing.author_id)?;

    comment::Entity::delete_many()
        .filter(comment::Column::ReviewId.eq(review_id))
        .exec(&txn)
        .await?;
    review::Entity::delete_by_id(review_id).exec(&txn).await?;

    recompute_title_rating(&txn, title_id).await?;
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}
