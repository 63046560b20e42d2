use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use yamdb_server::config::{AuthConfig, SuperuserConfig};
use yamdb_server::entity::user;
use yamdb_server::seed::ensure_superuser;

use crate::common::{TestApp, routes};

fn auth_with_superuser(username: &str, email: &str) -> AuthConfig {
    AuthConfig {
        jwt_secret: "test-secret-for-integration-tests".to_string(),
        token_ttl_days: 1,
        superuser: Some(SuperuserConfig {
            username: username.to_string(),
            email: email.to_string(),
        }),
    }
}

async fn load_user(app: &TestApp, username: &str) -> Option<user::Model> {
    user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(&app.db)
        .await
        .expect("DB query failed")
}

#[tokio::test]
async fn missing_superuser_is_created_and_can_sign_in_as_admin() {
    let app = TestApp::spawn().await;
    let config = auth_with_superuser("root", "root@example.com");

    ensure_superuser(&app.db, &config)
        .await
        .expect("Bootstrap should succeed");

    let root = load_user(&app, "root").await.expect("Superuser not created");
    assert!(root.is_superuser);
    assert_eq!(root.role, "admin");
    assert_eq!(root.email, "root@example.com");
    assert!(root.confirmation_code.is_none());

    let token = app.create_authenticated_user("root").await;
    let res = app.get_with_token(routes::USERS, &token).await;
    assert_eq!(res.status, 200, "{}", res.text);
}

#[tokio::test]
async fn running_bootstrap_again_keeps_a_single_account() {
    let app = TestApp::spawn().await;
    let config = auth_with_superuser("root", "root@example.com");

    ensure_superuser(&app.db, &config).await.unwrap();
    ensure_superuser(&app.db, &config).await.unwrap();

    let count = user::Entity::find()
        .filter(user::Column::Username.eq("root"))
        .count(&app.db)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn existing_user_is_promoted() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("alice").await;

    let before = app.get_with_token(routes::USERS, &token).await;
    assert_eq!(before.status, 403);

    ensure_superuser(&app.db, &auth_with_superuser("alice", "alice@example.com"))
        .await
        .expect("Bootstrap should succeed");

    let alice = load_user(&app, "alice").await.unwrap();
    assert!(alice.is_superuser);
    assert_eq!(alice.role, "admin");

    let after = app.get_with_token(routes::USERS, &token).await;
    assert_eq!(after.status, 200, "{}", after.text);
}

#[tokio::test]
async fn email_of_another_account_skips_bootstrap() {
    let app = TestApp::spawn().await;
    app.signup("alice").await;

    ensure_superuser(&app.db, &auth_with_superuser("root", "alice@example.com"))
        .await
        .expect("A taken email should not fail startup");

    assert!(load_user(&app, "root").await.is_none());

    let alice = load_user(&app, "alice").await.unwrap();
    assert!(!alice.is_superuser);
    assert_eq!(alice.role, "user");
}
