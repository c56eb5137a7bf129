//! Provider payment callbacks.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use executive_core::{OrderId, PaymentId, PaymentStatus};

use super::ValidationError;

/// A recorded payment callback. An order may collect several.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub amount: Decimal,
    pub provider: String,
    pub status: PaymentStatus,
    pub checkout_request_id: String,
    pub merchant_request_id: String,
    pub receipt: String,
    pub phone: String,
    #[schema(value_type = Object)]
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /payments/confirm`, sent by the payment bridge.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PaymentConfirmation {
    #[serde(default)]
    pub order_id: String,
    pub status: PaymentStatus,
    #[schema(value_type = f64)]
    pub amount: Decimal,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub checkout_request_id: String,
    #[serde(default)]
    pub merchant_request_id: String,
    #[serde(default, alias = "mpesa_receipt")]
    pub receipt: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default, alias = "raw")]
    #[schema(value_type = Object)]
    pub metadata: serde_json::Value,
}

impl PaymentConfirmation {
    /// # Errors
    ///
    /// Returns `ValidationError` if `order_id` is not a valid id.
    pub fn order_id(&self) -> Result<OrderId, ValidationError> {
        OrderId::parse(&self.order_id).map_err(|_| ValidationError::new("invalid order_id"))
    }

    #[must_use]
    pub fn into_payment(self, order_id: OrderId, now: DateTime<Utc>) -> Payment {
        Payment {
            id: PaymentId::generate(),
            order_id,
            amount: self.amount,
            provider: self.provider,
            status: self.status,
            checkout_request_id: self.checkout_request_id,
            merchant_request_id: self.merchant_request_id,
            receipt: self.receipt,
            phone: self.phone,
            metadata: self.metadata,
            created_at: now,
        }
    }
}
