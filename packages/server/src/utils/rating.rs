use sea_orm::prelude::Expr;
use sea_orm::*;

use crate::entity::{review, title};
use crate::error::AppError;

/// Average of `scores` rounded to one decimal place, `None` when empty.
///
/// Rounds the exact binary value half to even, so `1.25` becomes `1.2`.
pub fn average_rating(scores: &[i32]) -> Option<f64> {
    if scores.is_empty() {
        return None;
    }
    let sum: i64 = scores.iter().map(|&s| i64::from(s)).sum();
    let avg = sum as f64 / scores.len() as f64;
    format!("{avg:.1}").parse().ok()
}

/// Recompute and store the rating of `title_id` from its current reviews.
///
/// Call inside the transaction that changed the reviews.
pub async fn recompute_title_rating<C: ConnectionTrait>(
    db: &C,
    title_id: i32,
) -> Result<Option<f64>, AppError> {
    let scores: Vec<i32> = review::Entity::find()
        .filter(review::Column::TitleId.eq(title_id))
        .select_only()
        .column(review::Column::Score)
        .into_tuple()
        .all(db)
        .await?;

    let rating = average_rating(&scores);

    title::Entity::update_many()
        .col_expr(title::Column::Rating, Expr::value(rating))
        .filter(title::Column::Id.eq(title_id))
        .exec(db)
        .await?;

    Ok(rating)
}
