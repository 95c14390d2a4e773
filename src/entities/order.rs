use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Payment order entity.
///
/// `total_amount` is frozen at initiation time and never recomputed.
/// `payment_id` is the provider-assigned identifier used to correlate
/// webhook deliveries; `order_reference` is the opaque token this service
/// generated and submitted to the provider.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub total_amount: Decimal,
    pub payment_status: PaymentStatus,
    #[sea_orm(unique)]
    pub payment_id: String,
    pub order_reference: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Payment status enumeration.
///
/// The only defined transitions are Pending -> Success and Pending -> Failed.
/// The stored string values match the provider's wire spellings exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "Pending")]
    #[serde(rename = "Pending")]
    Pending,
    #[sea_orm(string_value = "SUCCESS")]
    #[serde(rename = "SUCCESS")]
    Success,
    #[sea_orm(string_value = "FAILED")]
    #[serde(rename = "FAILED")]
    Failed,
}
