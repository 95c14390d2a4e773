//! Shared test harness: an application instance wired to in-memory SQLite,
//! driven through the real router.
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request},
    response::Response,
    Router,
};
use cartpay_api::{
    config::AppConfig,
    entities::product,
    events::{self, EventSender},
    handlers::AppServices,
    migrator::Migrator,
    AppState,
};
use chrono::Utc;
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;
use serde_json::Value;
use sha2::Sha256;
use std::sync::Arc;
use tokio::sync::mpsc;
use tower::ServiceExt;

pub const TEST_WEBHOOK_SECRET: &str = "test_webhook_secret_key_0123456789";

pub struct TestApp {
    pub router: Router,
    pub db: Arc<DatabaseConnection>,
}

impl TestApp {
    /// App with an unreachable gateway; fine for everything that never
    /// initiates a payment.
    pub async fn new() -> Self {
        Self::with_gateway_url("http://127.0.0.1:9/api/v1/order/create").await
    }

    pub async fn with_gateway_url(gateway_url: &str) -> Self {
        // A pool of one connection keeps every query on the same in-memory
        // database; separate connections would each get a fresh one.
        let mut options = ConnectOptions::new("sqlite::memory:".to_string());
        options
            .max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);
        let db = Database::connect(options)
            .await
            .expect("connect in-memory sqlite");
        Migrator::up(&db, None).await.expect("run migrations");

        let config = AppConfig::new(
            "sqlite::memory:".into(),
            "127.0.0.1".into(),
            0,
            "development".into(),
            gateway_url.into(),
            "test_client_id".into(),
            "test_client_secret".into(),
            TEST_WEBHOOK_SECRET.into(),
        );

        let db = Arc::new(db);
        let (event_tx, event_rx) = mpsc::channel(64);
        let event_sender = EventSender::new(event_tx);
        tokio::spawn(events::process_events(event_rx));

        let services = AppServices::new(
            db.clone(),
            Arc::new(event_sender.clone()),
            Arc::new(config.clone()),
        )
        .expect("build services");

        let state = AppState {
            db: db.clone(),
            config,
            event_sender,
            services,
        };

        Self {
            router: cartpay_api::app_router(state),
            db,
        }
    }

    pub async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(path);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let request = builder.body(body).expect("build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("route request")
    }

    /// Delivers a webhook with the exact body bytes that were signed.
    pub async fn post_webhook(&self, body: String, signature: Option<&str>) -> Response {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri("/payment/webhook")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(sig) = signature {
            builder = builder.header("x-webhook-signature", sig);
        }

        let request = builder.body(Body::from(body)).expect("build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("route request")
    }

    pub async fn seed_product(&self, name: &str, price: Decimal, stock: i32) -> product::Model {
        product::ActiveModel {
            name: Set(name.to_string()),
            price: Set(price),
            stock: Set(stock),
            created_at: Set(Utc::now()),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .expect("seed product")
    }
}

/// HMAC-SHA256 hex signature over the body, as the provider computes it.
pub fn sign_body(body: &str, secret: &str) -> String {
    type HmacSha256 = Hmac<Sha256>;
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(body.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

pub async fn response_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body");
    serde_json::from_slice(&bytes).expect("json body")
}
