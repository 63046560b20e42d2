use sea_orm::sea_query::{Index, MysqlQueryBuilder, PostgresQueryBuilder, SqliteQueryBuilder};
use sea_orm::*;
use tracing::{info, warn};

use crate::config::AuthConfig;
use crate::entity::{review, user};
use crate::models::user::Role;

const REVIEW_AUTHOR_TITLE_INDEX: &str = "ux_review_author_title";

/// Ensure required database indexes exist.
///
/// Schema sync only knows single-column uniqueness, so the one-review-per-author
/// rule gets its composite unique index here.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    let index = Index::create()
        .if_not_exists()
        .unique()
        .name(REVIEW_AUTHOR_TITLE_INDEX)
        .table(review::Entity)
        .col(review::Column::AuthorId)
        .col(review::Column::TitleId)
        .to_owned();

    let stmt = match db.get_database_backend() {
        DbBackend::Postgres => index.to_string(PostgresQueryBuilder),
        DbBackend::MySql => index.to_string(MysqlQueryBuilder),
        _ => index.to_string(SqliteQueryBuilder),
    };

    match db.execute_unprepared(&stmt).await {
        Ok(_) => info!("Ensured index {} exists", REVIEW_AUTHOR_TITLE_INDEX),
        Err(e) => warn!(
            "Failed to create index {}: {}",
            REVIEW_AUTHOR_TITLE_INDEX, e
        ),
    }

    Ok(())
}

/// Create or promote the configured superuser account.
///
/// The account signs in like anyone else, through a confirmation code.
pub async fn ensure_superuser(db: &DatabaseConnection, config: &AuthConfig) -> Result<(), DbErr> {
    let Some(ref superuser) = config.superuser else {
        return Ok(());
    };

    let existing = user::Entity::find()
        .filter(user::Column::Username.eq(superuser.username.as_str()))
        .one(db)
        .await?;

    match existing {
        Some(model) if model.is_superuser && model.role == Role::Admin.as_str() => {}
        Some(model) => {
            let mut active: user::ActiveModel = model.into();
            active.role = Set(Role::Admin.to_string());
            active.is_superuser = Set(true);
            active.update(db).await?;
            info!(username = %superuser.username, "Promoted existing user to superuser");
        }
        None => {
            let email_taken = user::Entity::find()
                .filter(user::Column::Email.eq(superuser.email.as_str()))
                .count(db)
                .await?
                > 0;
            if email_taken {
                warn!(
                    email = %superuser.email,
                    "Superuser email belongs to another account, skipping bootstrap"
                );
                return Ok(());
            }

            user::ActiveModel {
                username: Set(superuser.username.clone()),
                email: Set(superuser.email.clone()),
                first_name: Set(String::new()),
                last_name: Set(String::new()),
                bio: Set(String::new()),
                role: Set(Role::Admin.to_string()),
                is_superuser: Set(true),
                confirmation_code: Set(None),
                date_joined: Set(chrono::Utc::now()),
                ..Default::default()
            }
            .insert(db)
            .await?;
            info!(username = %superuser.username, "Created superuser");
        }
    }

    Ok(())
}
