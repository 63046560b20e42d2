use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn user_comments_on_a_review() {
    let app = TestApp::spawn().await;
    let (_, title_id) = app.seed_title().await;
    let alice = app.create_authenticated_user("alice").await;
    let bob = app.create_authenticated_user("bob").await;
    let review_id = app.create_review(title_id, &alice, 8).await;

    let res = app
        .post_with_token(
            &routes::comments(title_id, review_id),
            &json!({"text": "Totally agree"}),
            &bob,
        )
        .await;

    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["author"], "bob");

    let fetched = app
        .get_without_token(&routes::comment(title_id, review_id, res.id()))
        .await;
    assert_eq!(fetched.status, 200);
    assert_eq!(fetched.body["text"], "Totally agree");
}

#[tokio::test]
async fn blank_comment_is_rejected() {
    let app = TestApp::spawn().await;
    let (_, title_id) = app.seed_title().await;
    let alice = app.create_authenticated_user("alice").await;
    let review_id = app.create_review(title_id, &alice, 8).await;

    let res = app
        .post_with_token(&routes::comments(title_id, review_id), &json!({"text": "  "}), &alice)
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn review_path_must_match_title() {
    let app = TestApp::spawn().await;
    let (admin, title_id) = app.seed_title().await;
    let other = app
        .create_title(&admin, "Apocalypse Now", 1979, &["drama"], "film")
        .await;
    let alice = app.create_authenticated_user("alice").await;
    let review_id = app.create_review(title_id, &alice, 8).await;

    let listed = app.get_without_token(&routes::comments(other, review_id)).await;
    assert_eq!(listed.status, 404);

    let posted = app
        .post_with_token(&routes::comments(other, review_id), &json!({"text": "Hi"}), &alice)
        .await;
    assert_eq!(posted.status, 404);
}

#[tokio::test]
async fn comment_path_must_match_review() {
    let app = TestApp::spawn().await;
    let (_, title_id) = app.seed_title().await;
    let alice = app.create_authenticated_user("alice").await;
    let bob = app.create_authenticated_user("bob").await;
    let alice_review = app.create_review(title_id, &alice, 8).await;
    let bob_review = app.create_review(title_id, &bob, 7).await;
    let comment_id = app.create_comment(title_id, alice_review, &bob).await;

    let res = app
        .get_without_token(&routes::comment(title_id, bob_review, comment_id))
        .await;

    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn only_author_or_staff_can_change_a_comment() {
    let app = TestApp::spawn().await;
    let (admin, title_id) = app.seed_title().await;
    let alice = app.create_authenticated_user("alice").await;
    let bob = app.create_authenticated_user("bob").await;
    let review_id = app.create_review(title_id, &alice, 8).await;
    let comment_id = app.create_comment(title_id, review_id, &bob).await;
    let path = routes::comment(title_id, review_id, comment_id);

    let by_stranger = app
        .patch_with_token(&path, &json!({"text": "Hijacked"}), &alice)
        .await;
    assert_eq!(by_stranger.status, 403);

    let by_author = app
        .patch_with_token(&path, &json!({"text": "Edited"}), &bob)
        .await;
    assert_eq!(by_author.status, 200, "{}", by_author.text);
    assert_eq!(by_author.body["text"], "Edited");

    let by_admin = app.delete_with_token(&path, &admin).await;
    assert_eq!(by_admin.status, 204);

    let gone = app.get_without_token(&path).await;
    assert_eq!(gone.status, 404);
}

#[tokio::test]
async fn deleting_a_review_removes_its_comments() {
    let app = TestApp::spawn().await;
    let (_, title_id) = app.seed_title().await;
    let alice = app.create_authenticated_user("alice").await;
    let review_id = app.create_review(title_id, &alice, 8).await;
    let comment_id = app.create_comment(title_id, review_id, &alice).await;

    let res = app
        .delete_with_token(&routes::review(title_id, review_id), &alice)
        .await;
    assert_eq!(res.status, 204);

    let gone = app
        .get_without_token(&routes::comment(title_id, review_id, comment_id))
        .await;
    assert_eq!(gone.status, 404);
}
