pub mod carts;
pub mod common;
pub mod payment_webhooks;
pub mod payments;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::errors::ServiceError;
use crate::events::EventSender;
use crate::gateway::PaymentGatewayClient;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub carts: crate::services::CartService,
    pub payments: crate::services::PaymentService,
}

impl AppServices {
    pub fn new(
        db: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        config: Arc<AppConfig>,
    ) -> Result<Self, ServiceError> {
        let gateway = PaymentGatewayClient::new(&config)?;
        let carts = crate::services::CartService::new(db.clone(), event_sender.clone());
        let payments = crate::services::PaymentService::new(
            db,
            config,
            gateway,
            carts.clone(),
            event_sender,
        );

        Ok(Self { carts, payments })
    }
}
