use crate::{config::AppConfig, errors::ServiceError};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info, instrument};

/// Order-creation request submitted to the payment provider.
///
/// Field names follow the provider's wire format.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayOrderRequest {
    pub order_id: String,
    pub order_amount: Decimal,
    pub order_currency: String,
    pub customer_email: String,
    pub customer_phone: String,
}

/// Successful provider response: the provider-assigned payment id plus the
/// raw body, which is returned to the caller untouched.
#[derive(Debug, Clone)]
pub struct GatewayOrder {
    pub payment_id: String,
    pub body: Value,
}

/// HTTP client for the external payment provider.
#[derive(Clone)]
pub struct PaymentGatewayClient {
    client: reqwest::Client,
    endpoint: String,
    client_id: String,
    client_secret: String,
}

impl PaymentGatewayClient {
    pub fn new(cfg: &AppConfig) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.payment_request_timeout_secs))
            .build()
            .map_err(|e| ServiceError::InternalError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: cfg.payment_gateway_url.clone(),
            client_id: cfg.payment_client_id.clone(),
            client_secret: cfg.payment_client_secret.clone(),
        })
    }

    /// Submits an order to the provider and extracts the assigned payment id.
    #[instrument(skip(self, request), fields(order_id = %request.order_id))]
    pub async fn create_order(
        &self,
        request: &GatewayOrderRequest,
    ) -> Result<GatewayOrder, ServiceError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-client-id", &self.client_id)
            .header("x-client-secret", &self.client_secret)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ServiceError::ProviderTimeout
                } else {
                    ServiceError::ProviderError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            error!(%status, "payment provider rejected order creation");
            return Err(ServiceError::ProviderError(format!(
                "provider returned {}",
                status
            )));
        }

        let body: Value = response.json().await.map_err(|e| {
            ServiceError::ProviderError(format!("invalid provider response: {}", e))
        })?;

        let payment_id = body
            .get("payment_id")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ServiceError::ProviderError("provider response missing payment_id".to_string())
            })?
            .to_string();

        info!(%payment_id, "payment provider accepted order");
        Ok(GatewayOrder { payment_id, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn order_request_uses_provider_wire_format() {
        let request = GatewayOrderRequest {
            order_id: "order_abc".into(),
            order_amount: dec!(25.50),
            order_currency: "INR".into(),
            customer_email: "user@example.com".into(),
            customer_phone: "9876543210".into(),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["orderId"], "order_abc");
        assert_eq!(json["orderAmount"], "25.50");
        assert_eq!(json["orderCurrency"], "INR");
        assert_eq!(json["customerEmail"], "user@example.com");
        assert_eq!(json["customerPhone"], "9876543210");
    }
}
