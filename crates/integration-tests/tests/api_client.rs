//! The typed backend client against the fake backend.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use deadforest_core::catalog::StoreQuery;
use deadforest_core::logs::LogQuery;
use deadforest_core::validation::{PromoCodeForm, validate_promo_code};
use deadforest_core::ProductId;
use deadforest_integration_tests::{
    ADMIN_EMAIL, ADMIN_PASSWORD, FakeBackend, USER_EMAIL, USER_PASSWORD,
};
use deadforest_storefront::api::{ApiClient, ApiToken};

fn client(backend: &FakeBackend) -> ApiClient {
    ApiClient::new(backend.url.clone(), Duration::from_secs(5)).unwrap()
}

async fn token(client: &ApiClient, email: &str, password: &str) -> ApiToken {
    ApiToken::new(client.auth().login(email, password).await.unwrap().access_token)
}

#[tokio::test]
async fn test_login_failure_carries_detail() {
    let backend = FakeBackend::spawn().await;
    let err = client(&backend)
        .auth()
        .login(USER_EMAIL, "nope")
        .await
        .unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(err.user_message(), "Incorrect email or password");
}

#[tokio::test]
async fn test_me_and_refresh() {
    let backend = FakeBackend::spawn().await;
    let client = client(&backend);
    let token = token(&client, USER_EMAIL, USER_PASSWORD).await;

    let me = client.auth().me(&token).await.unwrap();
    assert_eq!(me.email.as_str(), USER_EMAIL);
    assert!(!me.is_admin);

    let refreshed = client.auth().refresh(&token).await.unwrap();
    assert!(!refreshed.access_token.is_empty());
    let again = client
        .auth()
        .me(&ApiToken::new(refreshed.access_token))
        .await
        .unwrap();
    assert_eq!(again.id, me.id);
}

#[tokio::test]
async fn test_refresh_rejected_by_backend() {
    let backend = FakeBackend::spawn().await;
    let client = client(&backend);
    let token = token(&client, USER_EMAIL, USER_PASSWORD).await;

    backend.fail_refresh_with(reqwest::StatusCode::UNAUTHORIZED);
    let err = client.auth().refresh(&token).await.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(err.user_message(), "Could not refresh token");
}

#[tokio::test]
async fn test_catalog_filters() {
    let backend = FakeBackend::spawn().await;
    let client = client(&backend);
    let products = client.products();

    let all = products.list(&StoreQuery::default()).await.unwrap();
    assert_eq!(all.len(), 3);

    let icons = products
        .list(&StoreQuery::from_query_str("categories=Icon%20Sets"))
        .await
        .unwrap();
    assert_eq!(icons.len(), 1);
    assert_eq!(icons[0].name, "Pixel Icons");

    let rated = products
        .list(&StoreQuery::from_query_str("min_rating=4.5"))
        .await
        .unwrap();
    assert_eq!(rated.len(), 1);
    assert_eq!(rated[0].name, "Neon UI Kit");

    let err = products.get(ProductId::new(999)).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_cart_lifecycle() {
    let backend = FakeBackend::spawn().await;
    let client = client(&backend);
    let token = token(&client, USER_EMAIL, USER_PASSWORD).await;
    let cart = client.cart(&token);

    let item = cart.add(ProductId::new(1), 1).await.unwrap();
    cart.add(ProductId::new(1), 1).await.unwrap();
    let current = cart.get().await.unwrap();
    assert_eq!(current.items.len(), 1);
    assert_eq!(current.item_count(), 2);

    cart.update(item.id, 3).await.unwrap();
    assert_eq!(cart.get().await.unwrap().item_count(), 3);

    cart.remove(item.id).await.unwrap();
    assert!(cart.get().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_admin_endpoints_reject_regular_users() {
    let backend = FakeBackend::spawn().await;
    let client = client(&backend);
    let token = token(&client, USER_EMAIL, USER_PASSWORD).await;

    let err = client.admin(&token).stats().await.unwrap_err();
    assert!(!err.is_unauthorized());
    assert_eq!(err.user_message(), "Admin privileges required");
}

#[tokio::test]
async fn test_admin_logs_query() {
    let backend = FakeBackend::spawn().await;
    let client = client(&backend);
    let token = token(&client, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let admin = client.admin(&token);

    let logins = admin
        .logs(&LogQuery::new(Some(10), Some("user.login"), None, None, None))
        .await
        .unwrap();
    assert!(!logins.is_empty());
    assert!(logins.iter().all(|e| e.event.as_deref() == Some("user.login")));

    let bob = admin
        .logs(&LogQuery::new(None, None, Some(2), None, None))
        .await
        .unwrap();
    assert_eq!(bob.len(), 1);
    assert_eq!(bob[0].message, "Slow login");

    let cleared = admin.clear_logs().await.unwrap();
    assert!(cleared.removed >= 2);
    assert!(admin.logs(&LogQuery::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_role_changes_and_password_reset() {
    let backend = FakeBackend::spawn().await;
    let client = client(&backend);
    let token = token(&client, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let admin = client.admin(&token);

    admin.promote(USER_EMAIL).await.unwrap();
    assert!(backend.is_admin(USER_EMAIL));
    admin.demote(USER_EMAIL).await.unwrap();
    assert!(!backend.is_admin(USER_EMAIL));

    let err = admin.promote("ghost@deadforest.test").await.unwrap_err();
    assert_eq!(err.user_message(), "User not found");

    admin.reset_password(USER_EMAIL, "fresh-pass").await.unwrap();
    client.auth().login(USER_EMAIL, "fresh-pass").await.unwrap();

    let users = admin.users_full().await.unwrap();
    assert_eq!(users.len(), 2);
}

#[tokio::test]
async fn test_promo_codes() {
    let backend = FakeBackend::spawn().await;
    let client = client(&backend);
    let token = token(&client, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let admin = client.admin(&token);

    let promo = validate_promo_code(&PromoCodeForm {
        code: "spring",
        discount: "15",
        max_uses: "100",
        expires_at: "",
    })
    .unwrap();
    let created = admin.create_promo_code(&promo).await.unwrap();
    assert_eq!(created.code, promo.code);

    let err = admin.create_promo_code(&promo).await.unwrap_err();
    assert_eq!(err.user_message(), "Promo code already exists");

    admin.delete_promo_code(created.id).await.unwrap();
    assert!(admin.promo_codes().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unreachable_backend() {
    let client = ApiClient::new(
        url::Url::parse("http://127.0.0.1:9").unwrap(),
        Duration::from_secs(2),
    )
    .unwrap();
    let err = client.products().list(&StoreQuery::default()).await.unwrap_err();
    assert_eq!(err.user_message(), "Could not reach the server");
}
