use serde_json::json;

use crate::common::{TestApp, routes};

mod categories {
    use super::*;

    #[tokio::test]
    async fn anyone_can_list_categories_ordered_by_name() {
        let app = TestApp::spawn().await;
        let admin = app.create_user_with_role("admin", "admin").await;
        app.create_category(&admin, "Music", "music").await;
        app.create_category(&admin, "Book", "book").await;

        let res = app.get_without_token(routes::CATEGORIES).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["data"][0]["slug"], "book");
        assert_eq!(res.body["data"][1]["slug"], "music");
        assert_eq!(res.body["pagination"]["total_pages"], 1);
    }

    #[tokio::test]
    async fn search_matches_names_case_insensitively() {
        let app = TestApp::spawn().await;
        let admin = app.create_user_with_role("admin", "admin").await;
        app.create_category(&admin, "Music", "music").await;
        app.create_category(&admin, "Book", "book").await;

        let res = app
            .get_without_token(&format!("{}?search=mUs", routes::CATEGORIES))
            .await;

        assert_eq!(res.body["pagination"]["total"], 1);
        assert_eq!(res.body["data"][0]["name"], "Music");
    }

    #[tokio::test]
    async fn pagination_splits_results() {
        let app = TestApp::spawn().await;
        let admin = app.create_user_with_role("admin", "admin").await;
        for slug in ["a", "b", "c"] {
            app.create_category(&admin, &slug.to_uppercase(), slug).await;
        }

        let res = app
            .get_without_token(&format!("{}?page=2&per_page=2", routes::CATEGORIES))
            .await;

        assert_eq!(res.body["data"].as_array().unwrap().len(), 1);
        assert_eq!(res.body["data"][0]["slug"], "c");
        assert_eq!(res.body["pagination"]["total_pages"], 2);
    }

    #[tokio::test]
    async fn duplicate_slug_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.create_user_with_role("admin", "admin").await;
        app.create_category(&admin, "Film", "film").await;

        let res = app
            .post_with_token(
                routes::CATEGORIES,
                &json!({"name": "Movies", "slug": "film"}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn invalid_slug_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.create_user_with_role("admin", "admin").await;

        let res = app
            .post_with_token(
                routes::CATEGORIES,
                &json!({"name": "Films", "slug": "bad slug!"}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn non_admin_cannot_create_category() {
        let app = TestApp::spawn().await;
        let moderator = app.create_user_with_role("mod", "moderator").await;

        let res = app
            .post_with_token(
                routes::CATEGORIES,
                &json!({"name": "Film", "slug": "film"}),
                &moderator,
            )
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn anonymous_cannot_create_category() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(routes::CATEGORIES, &json!({"name": "Film", "slug": "film"}))
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn deleting_a_category_keeps_its_titles() {
        let app = TestApp::spawn().await;
        let (admin, title_id) = app.seed_title().await;

        let res = app.delete_with_token(&routes::category("film"), &admin).await;
        assert_eq!(res.status, 204, "{}", res.text);

        let title = app.get_without_token(&routes::title(title_id)).await;
        assert_eq!(title.status, 200);
        assert!(title.body["category"].is_null());
    }

    #[tokio::test]
    async fn deleting_unknown_category_is_not_found() {
        let app = TestApp::spawn().await;
        let admin = app.create_user_with_role("admin", "admin").await;

        let res = app.delete_with_token(&routes::category("nope"), &admin).await;

        assert_eq!(res.status, 404);
    }
}

mod genres {
    use super::*;

    #[tokio::test]
    async fn admin_creates_and_lists_genres() {
        let app = TestApp::spawn().await;
        let admin = app.create_user_with_role("admin", "admin").await;
        app.create_genre(&admin, "Thriller", "thriller").await;
        app.create_genre(&admin, "Comedy", "comedy").await;

        let res = app.get_without_token(routes::GENRES).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["data"][0]["name"], "Comedy");
        assert_eq!(res.body["pagination"]["total"], 2);
    }

    #[tokio::test]
    async fn duplicate_genre_slug_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.create_user_with_role("admin", "admin").await;
        app.create_genre(&admin, "Drama", "drama").await;

        let res = app
            .post_with_token(routes::GENRES, &json!({"name": "Drama 2", "slug": "drama"}), &admin)
            .await;

        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn deleting_a_genre_unlinks_it_from_titles() {
        let app = TestApp::spawn().await;
        let (admin, title_id) = app.seed_title().await;

        let res = app.delete_with_token(&routes::genre("drama"), &admin).await;
        assert_eq!(res.status, 204, "{}", res.text);

        let title = app.get_without_token(&routes::title(title_id)).await;
        assert_eq!(title.status, 200);
        assert_eq!(title.body["genre"], json!([]));
    }

    #[tokio::test]
    async fn regular_user_cannot_delete_genre() {
        let app = TestApp::spawn().await;
        let (_, _) = app.seed_title().await;
        let alice = app.create_authenticated_user("alice").await;

        let res = app.delete_with_token(&routes::genre("drama"), &alice).await;

        assert_eq!(res.status, 403);
    }
}
