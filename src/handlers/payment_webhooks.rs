use crate::handlers::common::success_response;
use crate::{errors::ServiceError, AppState};
use axum::{extract::State, http::HeaderMap, response::IntoResponse};
use bytes::Bytes;
use serde_json::json;
use tracing::warn;

/// Header carrying the provider's HMAC-SHA256 signature of the payload.
pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

/// Receive a payment status notification from the provider.
///
/// The raw body bytes are handed to the reconciler untouched: the signature
/// is computed over the exact payload as delivered, so any re-serialization
/// here would break verification.
#[utoipa::path(
    post,
    path = "/payment/webhook",
    request_body = String,
    responses(
        (status = 200, description = "Payment status updated"),
        (status = 400, description = "Invalid signature or malformed payload", body = crate::errors::ErrorResponse),
        (status = 404, description = "No order for the delivered payment id", body = crate::errors::ErrorResponse),
        (status = 409, description = "Delivery conflicts with a reconciled status", body = crate::errors::ErrorResponse)
    ),
    tag = "Payments"
)]
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ServiceError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    if signature.is_none() {
        warn!("webhook delivery missing {} header", SIGNATURE_HEADER);
    }

    let order = state
        .services
        .payments
        .reconcile_webhook(&body, signature)
        .await?;

    Ok(success_response(json!({
        "message": "Payment status updated",
        "orderId": order.id,
        "paymentStatus": order.payment_status,
    })))
}
