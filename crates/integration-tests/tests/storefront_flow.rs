//! Browser-level flows through the storefront against the fake backend.

#![allow(clippy::unwrap_used)]

use deadforest_integration_tests::{
    ADMIN_EMAIL, ADMIN_PASSWORD, FakeBackend, USER_EMAIL, USER_PASSWORD, browser, log_in, page,
    spawn_storefront,
};
use reqwest::{StatusCode, header::LOCATION};

#[tokio::test]
async fn test_store_lists_only_active_products() {
    let backend = FakeBackend::spawn().await;
    let storefront = spawn_storefront(&backend).await;

    let html = page(&browser(), format!("{storefront}/store")).await;
    assert!(html.contains("Neon UI Kit"));
    assert!(html.contains("Pixel Icons"));
    assert!(!html.contains("Retired Pack"));
}

#[tokio::test]
async fn test_store_sliders_at_bounds_keep_every_product() {
    let backend = FakeBackend::spawn().await;
    let storefront = spawn_storefront(&backend).await;

    let html = page(
        &browser(),
        format!("{storefront}/store?min_price=0&max_price=200&min_rating=0.0&max_rating=5.0"),
    )
    .await;
    assert!(html.contains("Neon UI Kit"));
    assert!(html.contains("Grain Brushes"));

    let html = page(&browser(), format!("{storefront}/store?min_rating=4.2")).await;
    assert!(html.contains("Neon UI Kit"));
    assert!(!html.contains("Grain Brushes"));
}

#[tokio::test]
async fn test_store_search_without_matches() {
    let backend = FakeBackend::spawn().await;
    let storefront = spawn_storefront(&backend).await;

    let html = page(&browser(), format!("{storefront}/store?q=nothing-like-this")).await;
    assert!(html.contains("No products found."));
}

#[tokio::test]
async fn test_wrong_password_shows_backend_message() {
    let backend = FakeBackend::spawn().await;
    let storefront = spawn_storefront(&backend).await;

    let response = browser()
        .post(format!("{storefront}/login"))
        .form(&[("email", USER_EMAIL), ("password", "wrong")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().contains("Incorrect email or password"));
}

#[tokio::test]
async fn test_cart_checkout_and_orders() {
    let backend = FakeBackend::spawn().await;
    let storefront = spawn_storefront(&backend).await;
    let client = browser();
    log_in(&client, &storefront, USER_EMAIL, USER_PASSWORD).await;

    let response = client
        .post(format!("{storefront}/cart/add"))
        .form(&[("product_id", "2"), ("quantity", "2"), ("return_to", "/store/2")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/store/2");

    let cart = page(&client, format!("{storefront}/cart")).await;
    assert!(cart.contains("Pixel Icons"));
    assert!(cart.contains("$59"));

    let response = client
        .post(format!("{storefront}/checkout"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/store");

    let orders = backend.orders_for(USER_EMAIL);
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["items"][0]["product_id"], 2);

    let history = page(&client, format!("{storefront}/orders")).await;
    assert!(history.contains("#0"));
}

#[tokio::test]
async fn test_checkout_with_empty_cart_goes_back_to_cart() {
    let backend = FakeBackend::spawn().await;
    let storefront = spawn_storefront(&backend).await;
    let client = browser();
    log_in(&client, &storefront, USER_EMAIL, USER_PASSWORD).await;

    let response = client
        .post(format!("{storefront}/checkout"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.headers()[LOCATION], "/cart");
    assert!(backend.orders_for(USER_EMAIL).is_empty());
}

#[tokio::test]
async fn test_non_admin_is_turned_away_from_admin() {
    let backend = FakeBackend::spawn().await;
    let storefront = spawn_storefront(&backend).await;
    let client = browser();
    log_in(&client, &storefront, USER_EMAIL, USER_PASSWORD).await;

    let response = client
        .get(format!("{storefront}/admin/logs"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/");
}

#[tokio::test]
async fn test_admin_logs_view_download_and_clear() {
    let backend = FakeBackend::spawn().await;
    let storefront = spawn_storefront(&backend).await;
    let client = browser();
    log_in(&client, &storefront, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let html = page(&client, format!("{storefront}/admin/logs")).await;
    assert!(html.contains("Backend started"));
    assert!(html.contains("Slow login"));

    let download = client
        .get(format!("{storefront}/admin/logs/download?level=WARNING"))
        .send()
        .await
        .unwrap();
    assert!(
        download.headers()["content-disposition"]
            .to_str()
            .unwrap()
            .starts_with("attachment;")
    );
    let entries: Vec<serde_json::Value> = download.json().await.unwrap();
    assert!(entries.iter().all(|entry| entry["level"] == "WARNING"));
    assert!(!entries.is_empty());

    let response = client
        .post(format!("{storefront}/admin/logs/clear"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.headers()[LOCATION], "/admin/logs");
    assert_eq!(backend.log_count(), 0);
}

#[tokio::test]
async fn test_request_id_reaches_backend() {
    let backend = FakeBackend::spawn().await;
    let storefront = spawn_storefront(&backend).await;

    browser()
        .get(format!("{storefront}/store"))
        .header("x-request-id", "trace-me-42")
        .send()
        .await
        .unwrap();
    assert!(backend.request_ids().iter().any(|id| id == "trace-me-42"));
}

#[tokio::test]
async fn test_logout_ends_session() {
    let backend = FakeBackend::spawn().await;
    let storefront = spawn_storefront(&backend).await;
    let client = browser();
    log_in(&client, &storefront, USER_EMAIL, USER_PASSWORD).await;

    client
        .post(format!("{storefront}/logout"))
        .send()
        .await
        .unwrap();
    let response = client
        .get(format!("{storefront}/profile"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.headers()[LOCATION], "/login");
}
