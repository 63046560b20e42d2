use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[sea_orm(column_type = "Text")]
    pub bio: String,

    /// One of: user, moderator, admin. See [`crate::models::user::Role`].
    pub role: String,
    /// Superusers pass every admin check regardless of `role`.
    pub is_superuser: bool,
    /// Argon2 hash of the last confirmation code sent, cleared once exchanged.
    pub confirmation_code: Option<String>,

    #[sea_orm(has_many)]
    pub reviews: HasMany<super::review::Entity>,

    #[sea_orm(has_many)]
    pub comments: HasMany<super::comment::Entity>,

    pub date_joined: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
