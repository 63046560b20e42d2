use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One review per author per title; the pair is backed by the
/// `ux_review_author_title` unique index created in [`crate::seed::ensure_indexes`].
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "review")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(column_type = "Text")]
    pub text: String,
    pub score: i32, // 1..=10

    pub title_id: i32,
    #[sea_orm(belongs_to, from = "title_id", to = "id")]
    pub title: HasOne<super::title::Entity>,

    pub author_id: i32,
    #[sea_orm(belongs_to, from = "author_id", to = "id")]
    pub author: HasOne<super::user::Entity>,

    #[sea_orm(has_many)]
    pub comments: HasMany<super::comment::Entity>,

    pub pub_date: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
