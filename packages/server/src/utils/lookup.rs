use std::collections::HashMap;

use sea_orm::*;

use crate::entity::{comment, review, title, user};
use crate::error::AppError;

/// Look up a title by ID, returning 404 if not found.
pub async fn find_title<C: ConnectionTrait>(db: &C, id: i32) -> Result<title::Model, AppError> {
    title::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Title not found".into()))
}

/// Look up a review that belongs to `title_id`, returning 404 otherwise.
pub async fn find_review<C: ConnectionTrait>(
    db: &C,
    title_id: i32,
    review_id: i32,
) -> Result<review::Model, AppError> {
    review::Entity::find_by_id(review_id)
        .filter(review::Column::TitleId.eq(title_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Review not found".into()))
}

/// Look up a comment that belongs to `review_id`, returning 404 otherwise.
pub async fn find_comment<C: ConnectionTrait>(
    db: &C,
    review_id: i32,
    comment_id: i32,
) -> Result<comment::Model, AppError> {
    comment::Entity::find_by_id(comment_id)
        .filter(comment::Column::ReviewId.eq(review_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".into()))
}

pub async fn find_user_by_username<C: ConnectionTrait>(
    db: &C,
    username: &str,
) -> Result<user::Model, AppError> {
    user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

/// Resolve author IDs to usernames in one query.
pub async fn usernames_by_id<C: ConnectionTrait>(
    db: &C,
    ids: impl IntoIterator<Item = i32>,
) -> Result<HashMap<i32, String>, AppError> {
    let mut ids: Vec<i32> = ids.into_iter().collect();
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(i32, String)> = user::Entity::find()
        .filter(user::Column::Id.is_in(ids))
        .select_only()
        .column(user::Column::Id)
        .column(user::Column::Username)
        .into_tuple()
        .all(db)
        .await?;

    Ok(rows.into_iter().collect())
}

/// Fetch the username of a single author.
pub async fn username_of<C: ConnectionTrait>(db: &C, author_id: i32) -> Result<String, AppError> {
    usernames_by_id(db, [author_id])
        .await?
        .remove(&author_id)
        .ok_or_else(|| AppError::Internal(format!("Author {author_id} missing")))
}
