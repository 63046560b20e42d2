//! Queries shared by the category and genre handlers.

use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::*;

use crate::error::AppError;
use crate::models::catalog::{CatalogEntryResponse, CatalogListQuery, CatalogListResponse};
use crate::models::shared::{Pagination, escape_like, page_bounds};

/// Page through entries of `E` ordered by `name`, filtered by `query.search`.
pub async fn list_entries<E, C>(
    db: &C,
    name: E::Column,
    id: E::Column,
    query: &CatalogListQuery,
) -> Result<CatalogListResponse, AppError>
where
    E: EntityTrait,
    E::Model: Into<CatalogEntryResponse> + Sync,
    C: ConnectionTrait,
{
    let (page, per_page) = page_bounds(query.page, query.per_page);
    let mut select = E::find();

    if let Some(ref search) = query.search {
        let term = escape_like(search.trim());
        if !term.is_empty() {
            select = select.filter(
                Expr::expr(Func::lower(Expr::col(name)))
                    .like(LikeExpr::new(format!("%{}%", term.to_lowercase())).escape('\\')),
            );
        }
    }

    let total = select.clone().paginate(db, per_page).num_items().await?;

    let data = select
        .order_by_asc(name)
        .order_by_asc(id)
        .offset(Some((page - 1) * per_page))
        .limit(Some(per_page))
        .all(db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(CatalogListResponse {
        data,
        pagination: Pagination::new(page, per_page, total),
    })
}

/// Fail with `VALIDATION_ERROR` when an entry of `E` already uses `slug`.
pub async fn ensure_slug_free<E, C>(
    db: &C,
    column: E::Column,
    slug: &str,
    kind: &str,
) -> Result<(), AppError>
where
    E: EntityTrait,
    E::Model: Sync,
    C: ConnectionTrait,
{
    let taken = E::find().filter(column.eq(slug)).count(db).await?;
    if taken > 0 {
        return Err(AppError::Validation(format!(
            "{kind} with slug '{slug}' already exists"
        )));
    }
    Ok(())
}
