use crate::{
    config::AppConfig,
    entities::{order, Order, PaymentStatus},
    errors::ServiceError,
    events::{Event, EventSender},
    gateway::{GatewayOrderRequest, PaymentGatewayClient},
    services::carts::CartService,
};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::Deserialize;
use sha2::Sha256;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Payment service: initiates provider payments for cart totals and
/// reconciles the resulting orders from signed webhook deliveries.
#[derive(Clone)]
pub struct PaymentService {
    db: Arc<DatabaseConnection>,
    config: Arc<AppConfig>,
    gateway: PaymentGatewayClient,
    carts: CartService,
    event_sender: Arc<EventSender>,
}

impl PaymentService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: Arc<AppConfig>,
        gateway: PaymentGatewayClient,
        carts: CartService,
        event_sender: Arc<EventSender>,
    ) -> Self {
        Self {
            db,
            config,
            gateway,
            carts,
            event_sender,
        }
    }

    /// Initiates a payment for the user's current cart total.
    ///
    /// Computes the total, submits an order to the provider under a freshly
    /// generated opaque reference, and persists a Pending order carrying the
    /// provider-assigned payment id. The provider's raw response body is
    /// returned to the caller. A provider or calculator failure leaves no
    /// order row behind; nothing is retried.
    #[instrument(skip(self))]
    pub async fn initiate_payment(
        &self,
        user_id: i64,
    ) -> Result<serde_json::Value, ServiceError> {
        let total = self.carts.cart_total(user_id).await?;

        // Random token, not timestamp-derived: concurrent initiations for the
        // same user must not collide.
        let reference = format!("order_{}", Uuid::new_v4().simple());

        let request = GatewayOrderRequest {
            order_id: reference.clone(),
            order_amount: total,
            order_currency: self.config.payment_currency.clone(),
            customer_email: self.config.payment_customer_email.clone(),
            customer_phone: self.config.payment_customer_phone.clone(),
        };

        let gateway_order = self.gateway.create_order(&request).await?;

        let order = order::ActiveModel {
            user_id: Set(user_id),
            total_amount: Set(total),
            payment_status: Set(PaymentStatus::Pending),
            payment_id: Set(gateway_order.payment_id.clone()),
            order_reference: Set(reference),
            created_at: Set(Utc::now()),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        self.event_sender
            .send_or_log(Event::PaymentInitiated {
                order_id: order.id,
                user_id,
                payment_id: order.payment_id.clone(),
                amount: order.total_amount,
            })
            .await;

        info!(
            order_id = order.id,
            payment_id = %order.payment_id,
            %total,
            "created pending order"
        );
        Ok(gateway_order.body)
    }

    /// Reconciles an order from a signed provider webhook.
    ///
    /// The signature is recomputed over the exact raw payload bytes and
    /// compared in constant time before anything else happens; on mismatch no
    /// state is touched. The order is then looked up by the provider-assigned
    /// payment id and its status transitioned inside a transaction.
    ///
    /// Redelivery carrying the order's current terminal status is a no-op;
    /// a delivery that would flip one terminal status to another is rejected
    /// with `Conflict`.
    #[instrument(skip(self, payload, signature))]
    pub async fn reconcile_webhook(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> Result<order::Model, ServiceError> {
        let signature = signature.ok_or(ServiceError::InvalidSignature)?;
        verify_signature(
            payload,
            signature,
            self.config.payment_webhook_secret.as_bytes(),
        )?;

        let notification: WebhookNotification = serde_json::from_slice(payload)
            .map_err(|e| ServiceError::ValidationError(format!("malformed webhook payload: {}", e)))?;

        let next = status_from_notification(&notification.status);

        let txn = self.db.begin().await?;

        let order = Order::find()
            .filter(order::Column::PaymentId.eq(notification.payment_id.as_str()))
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "order with payment id {} not found",
                    notification.payment_id
                ))
            })?;

        let reconciled = match order.payment_status {
            PaymentStatus::Pending => {
                let mut active: order::ActiveModel = order.into();
                active.payment_status = Set(next);
                active.updated_at = Set(Utc::now());
                let updated = active.update(&txn).await?;
                txn.commit().await?;

                self.event_sender
                    .send_or_log(Event::OrderReconciled {
                        order_id: updated.id,
                        payment_id: updated.payment_id.clone(),
                        status: notification.status.clone(),
                    })
                    .await;

                info!(
                    order_id = updated.id,
                    status = %notification.status,
                    "reconciled order payment status"
                );
                updated
            }
            current if current == next => {
                txn.commit().await?;
                warn!(
                    order_id = order.id,
                    "webhook redelivered for already-reconciled order; no-op"
                );
                order
            }
            current => {
                return Err(ServiceError::Conflict(format!(
                    "order {} already reconciled as {:?}; refusing to overwrite with {:?}",
                    order.id, current, next
                )));
            }
        };

        Ok(reconciled)
    }
}

/// Status notification payload delivered by the provider. Extra fields are
/// ignored; only the correlation id and the outcome matter here.
#[derive(Debug, Deserialize)]
pub struct WebhookNotification {
    pub payment_id: String,
    pub status: String,
}

/// Maps the provider's status field onto an order status. The match is
/// case-sensitive and exact: anything other than "SUCCESS" is a failure.
fn status_from_notification(status: &str) -> PaymentStatus {
    if status == "SUCCESS" {
        PaymentStatus::Success
    } else {
        PaymentStatus::Failed
    }
}

/// Hex-encoded HMAC-SHA256 of the payload under the shared secret.
pub(crate) fn expected_signature(payload: &[u8], secret: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts keys of any length");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Verifies a provided signature against the recomputed one in constant time.
pub(crate) fn verify_signature(
    payload: &[u8],
    provided: &str,
    secret: &[u8],
) -> Result<(), ServiceError> {
    let expected = expected_signature(payload, secret);
    if constant_time_eq(expected.as_bytes(), provided.as_bytes()) {
        Ok(())
    } else {
        Err(ServiceError::InvalidSignature)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b) {
        diff |= x ^ y;
    }
    diff == 0
}
