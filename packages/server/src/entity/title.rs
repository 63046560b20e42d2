use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "title")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,
    pub year: i32,
    #[sea_orm(column_type = "Text")]
    pub description: Option<String>,

    /// Average review score rounded to one decimal; NULL while unreviewed.
    pub rating: Option<f64>,

    /// NULL once the category has been deleted.
    pub category_id: Option<i32>,
    #[sea_orm(belongs_to, from = "category_id", to = "id")]
    pub category: HasOne<super::category::Entity>,

    #[sea_orm(has_many, via = "title_genre")]
    pub genres: HasMany<super::genre::Entity>,

    #[sea_orm(has_many)]
    pub reviews: HasMany<super::review::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
