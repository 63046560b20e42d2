use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/users", user_routes())
        .nest("/categories", category_routes())
        .nest("/genres", genre_routes())
        .nest("/titles", title_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::signup))
        .routes(routes!(handlers::auth::token))
}

fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::user::list_users,
            handlers::user::create_user
        ))
        .routes(routes!(handlers::user::get_me, handlers::user::update_me))
        .routes(routes!(
            handlers::user::get_user,
            handlers::user::update_user,
            handlers::user::delete_user
        ))
}

fn category_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::category::list_categories,
            handlers::category::create_category
        ))
        .routes(routes!(handlers::category::delete_category))
}

fn genre_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::genre::list_genres,
            handlers::genre::create_genre
        ))
        .routes(routes!(handlers::genre::delete_genre))
}

fn title_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::title::list_titles,
            handlers::title::create_title
        ))
        .routes(routes!(
            handlers::title::get_title,
            handlers::title::update_title,
            handlers::title::delete_title
        ))
        .nest("/{title_id}/reviews", review_routes())
}

fn review_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::review::list_reviews,
            handlers::review::create_review
        ))
        .routes(routes!(
            handlers::review::get_review,
            handlers::review::update_review,
            handlers::review::delete_review
        ))
        .nest("/{review_id}/comments", comment_routes())
}

fn comment_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::comment::list_comments,
            handlers::comment::create_comment
        ))
        .routes(routes!(
            handlers::comment::get_comment,
            handlers::comment::update_comment,
            handlers::comment::delete_comment
        ))
}
