use crate::handlers::common::success_response;
use crate::{errors::ServiceError, AppState};
use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::post,
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;

/// Creates the router for payment endpoints
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/payment/initiate", post(initiate_payment))
        .route(
            "/payment/webhook",
            post(super::payment_webhooks::payment_webhook),
        )
}

/// Initiate a payment for a user's current cart total
#[utoipa::path(
    post,
    path = "/payment/initiate",
    request_body = InitiatePaymentRequest,
    responses(
        (status = 200, description = "Provider response for the created payment order"),
        (status = 400, description = "Cart error or provider failure", body = crate::errors::ErrorResponse)
    ),
    tag = "Payments"
)]
pub async fn initiate_payment(
    State(state): State<AppState>,
    Json(payload): Json<InitiatePaymentRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let body = state
        .services
        .payments
        .initiate_payment(payload.user_id)
        .await?;

    // The provider's raw response body is passed through to the caller
    Ok(success_response(body))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InitiatePaymentRequest {
    pub user_id: i64,
}
