use crate::{
    entities::{cart_item, CartItem, Product},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;

/// Cart service for managing per-user cart lines and computing cart totals.
///
/// Repeated adds for the same (user, product) pair merge into one line; the
/// payment flow never mutates cart lines, it only reads them through
/// [`CartService::cart_total`].
#[derive(Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CartService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Adds a line to the user's cart, merging quantity into an existing line
    /// for the same product.
    ///
    /// # Errors
    ///
    /// * `ServiceError::ProductNotFound` - the product does not exist
    /// * `ServiceError` - database transaction error
    #[instrument(skip(self))]
    pub async fn add_line(
        &self,
        input: AddCartLineInput,
    ) -> Result<cart_item::Model, ServiceError> {
        let txn = self.db.begin().await?;

        // The catalog is the source of truth; dangling product references are
        // rejected at the door rather than surfacing later in totals.
        Product::find_by_id(input.product_id)
            .one(&txn)
            .await?
            .ok_or(ServiceError::ProductNotFound(input.product_id))?;

        let existing = CartItem::find()
            .filter(cart_item::Column::UserId.eq(input.user_id))
            .filter(cart_item::Column::ProductId.eq(input.product_id))
            .one(&txn)
            .await?;

        let line = if let Some(line) = existing {
            let merged = line.quantity + input.quantity;
            let mut line: cart_item::ActiveModel = line.into();
            line.quantity = Set(merged);
            line.updated_at = Set(Utc::now());
            line.update(&txn).await?
        } else {
            cart_item::ActiveModel {
                user_id: Set(input.user_id),
                product_id: Set(input.product_id),
                quantity: Set(input.quantity),
                created_at: Set(Utc::now()),
                updated_at: Set(Utc::now()),
                ..Default::default()
            }
            .insert(&txn)
            .await?
        };

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartLineAdded {
                user_id: input.user_id,
                product_id: input.product_id,
                quantity: input.quantity,
            })
            .await;

        info!(
            user_id = input.user_id,
            product_id = input.product_id,
            quantity = line.quantity,
            "added cart line"
        );
        Ok(line)
    }

    /// Returns the user's cart with product details resolved per line.
    ///
    /// An empty cart yields an empty list. A line referencing a product that
    /// no longer exists surfaces `ProductNotFound` instead of being skipped.
    #[instrument(skip(self))]
    pub async fn get_cart(&self, user_id: i64) -> Result<Vec<CartLineDetail>, ServiceError> {
        let lines = CartItem::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .order_by_asc(cart_item::Column::Id)
            .all(&*self.db)
            .await?;

        let mut details = Vec::with_capacity(lines.len());
        for line in lines {
            let product = Product::find_by_id(line.product_id)
                .one(&*self.db)
                .await?
                .ok_or(ServiceError::ProductNotFound(line.product_id))?;

            details.push(CartLineDetail {
                product_id: product.id,
                name: product.name,
                price: product.price,
                quantity: line.quantity,
            });
        }

        Ok(details)
    }

    /// Sets the quantity of an existing cart line.
    ///
    /// # Errors
    ///
    /// * `ServiceError::NotFound` - no line exists for the pair; storage is
    ///   left unchanged
    #[instrument(skip(self))]
    pub async fn update_line(
        &self,
        user_id: i64,
        product_id: i64,
        quantity: i32,
    ) -> Result<cart_item::Model, ServiceError> {
        let line = CartItem::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .filter(cart_item::Column::ProductId.eq(product_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "cart line for user {} and product {} not found",
                    user_id, product_id
                ))
            })?;

        let mut line: cart_item::ActiveModel = line.into();
        line.quantity = Set(quantity);
        line.updated_at = Set(Utc::now());
        let line = line.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CartLineUpdated {
                user_id,
                product_id,
                quantity,
            })
            .await;

        Ok(line)
    }

    /// Removes a cart line.
    ///
    /// # Errors
    ///
    /// * `ServiceError::NotFound` - no line exists for the pair
    #[instrument(skip(self))]
    pub async fn remove_line(&self, user_id: i64, product_id: i64) -> Result<(), ServiceError> {
        let line = CartItem::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .filter(cart_item::Column::ProductId.eq(product_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "cart line for user {} and product {} not found",
                    user_id, product_id
                ))
            })?;

        CartItem::delete_by_id(line.id).exec(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CartLineRemoved {
                user_id,
                product_id,
            })
            .await;

        info!(user_id, product_id, "removed cart line");
        Ok(())
    }

    /// Computes the monetary total of the user's cart.
    ///
    /// Pure read: sum over all lines of quantity x product price. An empty
    /// cart totals exactly zero; a dangling product reference surfaces
    /// `ProductNotFound` rather than being priced at zero.
    #[instrument(skip(self))]
    pub async fn cart_total(&self, user_id: i64) -> Result<Decimal, ServiceError> {
        let lines = CartItem::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .all(&*self.db)
            .await?;

        let mut priced = Vec::with_capacity(lines.len());
        for line in &lines {
            let product = Product::find_by_id(line.product_id)
                .one(&*self.db)
                .await?
                .ok_or(ServiceError::ProductNotFound(line.product_id))?;
            priced.push((product.price, line.quantity));
        }

        Ok(sum_line_totals(priced))
    }
}

/// Sums quantity x price pairs into a cart total.
pub(crate) fn sum_line_totals<I>(lines: I) -> Decimal
where
    I: IntoIterator<Item = (Decimal, i32)>,
{
    lines
        .into_iter()
        .fold(Decimal::ZERO, |total, (price, quantity)| {
            total + price * Decimal::from(quantity)
        })
}

/// Input for adding a cart line
#[derive(Debug, Deserialize)]
pub struct AddCartLineInput {
    pub user_id: i64,
    pub product_id: i64,
    pub quantity: i32,
}

/// One resolved cart line as returned by the cart-detail endpoint
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartLineDetail {
    pub product_id: i64,
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
}
