use serde_json::json;

use crate::common::{TestApp, routes};

mod signup {
    use super::*;

    #[tokio::test]
    async fn new_user_receives_a_confirmation_code() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::SIGNUP,
                &json!({"username": "alice", "email": "alice@example.com"}),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["username"], "alice");
        assert_eq!(res.body["email"], "alice@example.com");
        assert!(app.mailer.code_for("alice").is_some());
    }

    #[tokio::test]
    async fn repeating_signup_with_same_pair_resends_a_fresh_code() {
        let app = TestApp::spawn().await;
        let first = app.signup("alice").await;
        let second = app.signup("alice").await;

        assert_ne!(first, second);

        let stale = app
            .post_without_token(
                routes::TOKEN,
                &json!({"username": "alice", "confirmation_code": first}),
            )
            .await;
        assert_eq!(stale.status, 400);
        assert_eq!(stale.body["code"], "INVALID_CONFIRMATION_CODE");

        let fresh = app
            .post_without_token(
                routes::TOKEN,
                &json!({"username": "alice", "confirmation_code": second}),
            )
            .await;
        assert_eq!(fresh.status, 200, "{}", fresh.text);
    }

    #[tokio::test]
    async fn email_of_another_account_is_rejected() {
        let app = TestApp::spawn().await;
        app.signup("alice").await;

        let res = app
            .post_without_token(
                routes::SIGNUP,
                &json!({"username": "bob", "email": "alice@example.com"}),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn username_with_a_different_email_is_rejected() {
        let app = TestApp::spawn().await;
        app.signup("alice").await;

        let res = app
            .post_without_token(
                routes::SIGNUP,
                &json!({"username": "alice", "email": "other@example.com"}),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn username_me_is_reserved() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::SIGNUP,
                &json!({"username": "me", "email": "me@example.com"}),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn malformed_email_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::SIGNUP,
                &json!({"username": "alice", "email": "not-an-email"}),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod token {
    use super::*;

    #[tokio::test]
    async fn valid_code_yields_a_token_that_authenticates() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;

        let res = app.get_with_token(routes::ME, &token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["username"], "alice");
        assert_eq!(res.body["role"], "user");
    }

    #[tokio::test]
    async fn wrong_code_is_rejected() {
        let app = TestApp::spawn().await;
        app.signup("alice").await;

        let res = app
            .post_without_token(
                routes::TOKEN,
                &json!({"username": "alice", "confirmation_code": "definitely-wrong"}),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "INVALID_CONFIRMATION_CODE");
    }

    #[tokio::test]
    async fn code_cannot_be_exchanged_twice() {
        let app = TestApp::spawn().await;
        let code = app.signup("alice").await;
        let body = json!({"username": "alice", "confirmation_code": code});

        let first = app.post_without_token(routes::TOKEN, &body).await;
        assert_eq!(first.status, 200, "{}", first.text);

        let second = app.post_without_token(routes::TOKEN, &body).await;
        assert_eq!(second.status, 400);
        assert_eq!(second.body["code"], "INVALID_CONFIRMATION_CODE");
    }

    #[tokio::test]
    async fn concurrent_exchanges_issue_a_single_token() {
        let app = TestApp::spawn().await;
        let code = app.signup("alice").await;
        let body = json!({"username": "alice", "confirmation_code": code});

        let (a, b) = tokio::join!(
            app.post_without_token(routes::TOKEN, &body),
            app.post_without_token(routes::TOKEN, &body),
        );

        let mut statuses = [a.status, b.status];
        statuses.sort();
        assert_eq!(statuses, [200, 400], "{} / {}", a.text, b.text);
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::TOKEN,
                &json!({"username": "ghost", "confirmation_code": "whatever"}),
            )
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn missing_fields_are_a_validation_error() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(routes::TOKEN, &json!({"username": "alice"}))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod bearer {
    use super::*;

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::ME).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn garbage_token_is_unauthorized() {
        let app = TestApp::spawn().await;

        let res = app.get_with_token(routes::ME, "not.a.jwt").await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn token_of_a_deleted_user_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.create_user_with_role("admin", "admin").await;
        let alice = app.create_authenticated_user("alice").await;

        let del = app.delete_with_token(&routes::user("alice"), &admin).await;
        assert_eq!(del.status, 204, "{}", del.text);

        let res = app.get_with_token(routes::ME, &alice).await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }
}
