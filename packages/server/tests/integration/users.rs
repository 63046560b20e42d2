use serde_json::json;

use crate::common::{TestApp, routes};

mod admin_management {
    use super::*;

    #[tokio::test]
    async fn admin_lists_users_ordered_by_username() {
        let app = TestApp::spawn().await;
        let admin = app.create_user_with_role("admin", "admin").await;
        app.signup("zoe").await;
        app.signup("bob").await;

        let res = app.get_with_token(routes::USERS, &admin).await;

        assert_eq!(res.status, 200, "{}", res.text);
        let names: Vec<&str> = res.body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|u| u["username"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["admin", "bob", "zoe"]);
        assert_eq!(res.body["pagination"]["total"], 3);
    }

    #[tokio::test]
    async fn search_filters_by_username_substring() {
        let app = TestApp::spawn().await;
        let admin = app.create_user_with_role("admin", "admin").await;
        app.signup("alice").await;
        app.signup("malik").await;

        let res = app
            .get_with_token(&format!("{}?search=LI", routes::USERS), &admin)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["pagination"]["total"], 2);
    }

    #[tokio::test]
    async fn regular_user_cannot_list_users() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;

        let res = app.get_with_token(routes::USERS, &alice).await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn moderator_cannot_manage_users() {
        let app = TestApp::spawn().await;
        let moderator = app.create_user_with_role("mod", "moderator").await;

        let res = app
            .post_with_token(
                routes::USERS,
                &json!({"username": "carol", "email": "carol@example.com"}),
                &moderator,
            )
            .await;

        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn admin_creates_user_with_role() {
        let app = TestApp::spawn().await;
        let admin = app.create_user_with_role("admin", "admin").await;

        let res = app
            .post_with_token(
                routes::USERS,
                &json!({
                    "username": "carol",
                    "email": "carol@example.com",
                    "role": "moderator",
                    "bio": "Film buff",
                }),
                &admin,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["role"], "moderator");
        assert_eq!(res.body["bio"], "Film buff");
        assert_eq!(res.body["first_name"], "");
    }

    #[tokio::test]
    async fn created_user_can_later_sign_up_for_a_code() {
        let app = TestApp::spawn().await;
        let admin = app.create_user_with_role("admin", "admin").await;
        let created = app
            .post_with_token(
                routes::USERS,
                &json!({"username": "carol", "email": "carol@example.com"}),
                &admin,
            )
            .await;
        assert_eq!(created.status, 201, "{}", created.text);

        let token = app.create_authenticated_user("carol").await;
        let me = app.get_with_token(routes::ME, &token).await;
        assert_eq!(me.body["username"], "carol");
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.create_user_with_role("admin", "admin").await;

        let res = app
            .post_with_token(
                routes::USERS,
                &json!({"username": "imposter", "email": "admin@example.com"}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn admin_changes_role_of_another_user() {
        let app = TestApp::spawn().await;
        let admin = app.create_user_with_role("admin", "admin").await;
        app.signup("alice").await;

        let res = app
            .patch_with_token(&routes::user("alice"), &json!({"role": "moderator"}), &admin)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["role"], "moderator");

        let fetched = app.get_with_token(&routes::user("alice"), &admin).await;
        assert_eq!(fetched.body["role"], "moderator");
    }

    #[tokio::test]
    async fn unknown_role_is_a_validation_error() {
        let app = TestApp::spawn().await;
        let admin = app.create_user_with_role("admin", "admin").await;
        app.signup("alice").await;

        let res = app
            .patch_with_token(&routes::user("alice"), &json!({"role": "overlord"}), &admin)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let app = TestApp::spawn().await;
        let admin = app.create_user_with_role("admin", "admin").await;

        let res = app.get_with_token(&routes::user("ghost"), &admin).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn deleting_a_user_removes_their_content_and_updates_ratings() {
        let app = TestApp::spawn().await;
        let (admin, title_id) = app.seed_title().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;

        let alice_review = app.create_review(title_id, &alice, 2).await;
        let bob_review = app.create_review(title_id, &bob, 8).await;
        app.create_comment(title_id, bob_review, &alice).await;
        app.create_comment(title_id, alice_review, &bob).await;

        let before = app.get_without_token(&routes::title(title_id)).await;
        assert_eq!(before.body["rating"], 5.0);

        let res = app.delete_with_token(&routes::user("alice"), &admin).await;
        assert_eq!(res.status, 204, "{}", res.text);

        let after = app.get_without_token(&routes::title(title_id)).await;
        assert_eq!(after.body["rating"], 8.0);

        let reviews = app.get_without_token(&routes::reviews(title_id)).await;
        assert_eq!(reviews.body["pagination"]["total"], 1);

        let comments = app
            .get_without_token(&routes::comments(title_id, bob_review))
            .await;
        assert_eq!(comments.body["pagination"]["total"], 0);
    }
}

mod me {
    use super::*;

    #[tokio::test]
    async fn user_updates_own_profile() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;

        let res = app
            .patch_with_token(
                routes::ME,
                &json!({"first_name": "Alice", "bio": "Reads a lot"}),
                &alice,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["first_name"], "Alice");
        assert_eq!(res.body["bio"], "Reads a lot");
    }

    #[tokio::test]
    async fn role_in_self_update_is_ignored() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;

        let res = app
            .patch_with_token(routes::ME, &json!({"role": "admin"}), &alice)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["role"], "user");

        let admin_only = app.get_with_token(routes::USERS, &alice).await;
        assert_eq!(admin_only.status, 403);
    }

    #[tokio::test]
    async fn username_taken_by_someone_else_is_rejected() {
        let app = TestApp::spawn().await;
        app.signup("bob").await;
        let alice = app.create_authenticated_user("alice").await;

        let res = app
            .patch_with_token(routes::ME, &json!({"username": "bob"}), &alice)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}
