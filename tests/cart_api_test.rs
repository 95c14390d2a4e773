//! Integration tests for the cart endpoints, run against the real router
//! with an in-memory SQLite store.

mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;
use std::str::FromStr;

fn price_of(value: &serde_json::Value) -> Decimal {
    Decimal::from_str(value.as_str().expect("price serialized as string")).expect("decimal price")
}

#[tokio::test]
async fn add_then_fetch_returns_matching_line() {
    let app = TestApp::new().await;
    let product = app.seed_product("productA", dec!(10.00), 5).await;

    let response = app
        .request(
            Method::POST,
            "/cart",
            Some(json!({"userId": 1, "productId": product.id, "quantity": 2})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = response_json(response).await;
    assert_eq!(body["message"], "Item added to cart");
    assert_eq!(body["line"]["userId"], 1);
    assert_eq!(body["line"]["productId"], product.id);
    assert_eq!(body["line"]["quantity"], 2);

    let response = app.request(Method::GET, "/cart/1", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    let cart = body["cart"].as_array().expect("cart array");
    assert_eq!(cart.len(), 1);
    assert_eq!(cart[0]["productId"], product.id);
    assert_eq!(cart[0]["name"], "productA");
    assert_eq!(cart[0]["quantity"], 2);
    assert_eq!(price_of(&cart[0]["price"]), dec!(10.00));
}

#[tokio::test]
async fn fetching_an_empty_cart_returns_empty_list() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/cart/99", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["cart"].as_array().expect("cart array").len(), 0);
}

#[tokio::test]
async fn adding_unknown_product_is_rejected() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/cart",
            Some(json!({"userId": 1, "productId": 9999, "quantity": 1})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response_json(response).await;
    assert_eq!(body["message"], "Product 9999 not found");
}

#[tokio::test]
async fn adding_zero_quantity_is_rejected() {
    let app = TestApp::new().await;
    let product = app.seed_product("productA", dec!(10.00), 5).await;

    let response = app
        .request(
            Method::POST,
            "/cart",
            Some(json!({"userId": 1, "productId": product.id, "quantity": 0})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn repeated_add_merges_into_one_line() {
    let app = TestApp::new().await;
    let product = app.seed_product("productA", dec!(10.00), 5).await;

    for quantity in [2, 3] {
        let response = app
            .request(
                Method::POST,
                "/cart",
                Some(json!({"userId": 1, "productId": product.id, "quantity": quantity})),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let body = response_json(app.request(Method::GET, "/cart/1", None).await).await;
    let cart = body["cart"].as_array().expect("cart array");
    assert_eq!(cart.len(), 1, "same pair must merge, not duplicate");
    assert_eq!(cart[0]["quantity"], 5);
}

#[tokio::test]
async fn updating_a_line_changes_its_quantity() {
    let app = TestApp::new().await;
    let product = app.seed_product("productA", dec!(10.00), 5).await;

    app.request(
        Method::POST,
        "/cart",
        Some(json!({"userId": 1, "productId": product.id, "quantity": 2})),
    )
    .await;

    let response = app
        .request(
            Method::PUT,
            "/cart",
            Some(json!({"userId": 1, "productId": product.id, "quantity": 7})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["message"], "Cart updated");
    assert_eq!(body["line"]["quantity"], 7);

    let body = response_json(app.request(Method::GET, "/cart/1", None).await).await;
    assert_eq!(body["cart"][0]["quantity"], 7);
}

#[tokio::test]
async fn updating_a_missing_line_returns_not_found_and_changes_nothing() {
    let app = TestApp::new().await;
    let product = app.seed_product("productA", dec!(10.00), 5).await;

    let response = app
        .request(
            Method::PUT,
            "/cart",
            Some(json!({"userId": 42, "productId": product.id, "quantity": 5})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = response_json(app.request(Method::GET, "/cart/42", None).await).await;
    assert_eq!(body["cart"].as_array().expect("cart array").len(), 0);
}

#[tokio::test]
async fn removing_a_line_empties_the_cart() {
    let app = TestApp::new().await;
    let product = app.seed_product("productA", dec!(10.00), 5).await;

    app.request(
        Method::POST,
        "/cart",
        Some(json!({"userId": 1, "productId": product.id, "quantity": 2})),
    )
    .await;

    let response = app
        .request(
            Method::DELETE,
            "/cart",
            Some(json!({"userId": 1, "productId": product.id})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["message"], "Item removed from cart");

    let body = response_json(app.request(Method::GET, "/cart/1", None).await).await;
    assert_eq!(body["cart"].as_array().expect("cart array").len(), 0);
}

#[tokio::test]
async fn removing_a_missing_line_returns_not_found() {
    let app = TestApp::new().await;
    let product = app.seed_product("productA", dec!(10.00), 5).await;

    let response = app
        .request(
            Method::DELETE,
            "/cart",
            Some(json!({"userId": 42, "productId": product.id})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn carts_are_isolated_per_user() {
    let app = TestApp::new().await;
    let product_a = app.seed_product("productA", dec!(10.00), 5).await;
    let product_b = app.seed_product("productB", dec!(5.50), 3).await;

    app.request(
        Method::POST,
        "/cart",
        Some(json!({"userId": 1, "productId": product_a.id, "quantity": 2})),
    )
    .await;
    app.request(
        Method::POST,
        "/cart",
        Some(json!({"userId": 2, "productId": product_b.id, "quantity": 1})),
    )
    .await;

    let body = response_json(app.request(Method::GET, "/cart/1", None).await).await;
    let cart = body["cart"].as_array().expect("cart array");
    assert_eq!(cart.len(), 1);
    assert_eq!(cart[0]["name"], "productA");

    let body = response_json(app.request(Method::GET, "/cart/2", None).await).await;
    let cart = body["cart"].as_array().expect("cart array");
    assert_eq!(cart.len(), 1);
    assert_eq!(cart[0]["name"], "productB");
}

#[tokio::test]
async fn health_endpoint_reports_database_status() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["database"], "healthy");
}
