//! Orders and their line items.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use executive_core::{
    AddressId, OrderId, OrderItemId, OrderStatus, ProductId, UserId, order_total,
    require_positive,
};

use super::ValidationError;

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub address_id: AddressId,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub total: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line item. `price` is the unit price at the time the order was placed.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub price: Decimal,
}

/// A line item joined with its product name.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct OrderItemDetailed {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub price: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItemDetailed>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateOrderItem {
    pub product_id: ProductId,
    #[serde(default)]
    pub quantity: i32,
    #[serde(default)]
    #[schema(value_type = f64)]
    pub price: Decimal,
}

/// Body of `POST /orders`.
///
/// Clients may send a `total`; it is ignored and recomputed from the items.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateOrderPayload {
    #[serde(default)]
    pub items: Vec<CreateOrderItem>,
}

impl CreateOrderPayload {
    /// Check every line and return the exact order total.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for an empty item list or for the first
    /// line whose quantity or price is not strictly positive.
    pub fn validate(&self) -> Result<Decimal, ValidationError> {
        if self.items.is_empty() {
            return Err(ValidationError::new(
                "order must contain at least one item",
            ));
        }
        for (index, item) in self.items.iter().enumerate() {
            if item.quantity <= 0 {
                return Err(ValidationError(format!(
                    "item {index}: quantity must be greater than zero"
                )));
            }
            require_positive("price", item.price)
                .map_err(|e| ValidationError(format!("item {index}: {e}")))?;
        }
        Ok(order_total(
            self.items.iter().map(|item| (item.quantity, item.price)),
        )?)
    }
}

/// Body of `PATCH /orders/{id}`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderPayload {
    pub status: String,
}

impl UpdateOrderPayload {
    /// # Errors
    ///
    /// Returns `ValidationError` unless the status is one of
    /// pending, paid, shipped, completed or cancelled.
    pub fn validate(&self) -> Result<OrderStatus, ValidationError> {
        self.status
            .trim()
            .parse()
            .map_err(|e: executive_core::StatusError| ValidationError(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn order(items: serde_json::Value) -> CreateOrderPayload {
        serde_json::from_value(serde_json::json!({ "items": items, "total": 999 })).unwrap()
    }

    #[test]
    fn test_total_ignores_client_value() {
        let p = ProductId::generate().to_string();
        let payload = order(serde_json::json!([
            {"product_id": p, "quantity": 2, "price": 10.0},
            {"product_id": p, "quantity": 1, "price": 0.25}
        ]));
        assert_eq!(payload.validate().unwrap(), Decimal::new(2025, 2));
    }

    #[test]
    fn test_empty_items_rejected() {
        let err = order(serde_json::json!([])).validate().unwrap_err();
        assert_eq!(err.0, "order must contain at least one item");
    }

    #[test]
    fn test_first_bad_line_reported() {
        let p = ProductId::generate().to_string();
        let payload = order(serde_json::json!([
            {"product_id": p, "quantity": 1, "price": 5},
            {"product_id": p, "quantity": 0, "price": 5},
            {"product_id": p, "quantity": 1, "price": -1}
        ]));
        assert_eq!(
            payload.validate().unwrap_err().0,
            "item 1: quantity must be greater than zero"
        );
    }

    #[test]
    fn test_status_update() {
        let ok = UpdateOrderPayload { status: "shipped".into() };
        assert_eq!(ok.validate().unwrap(), OrderStatus::Shipped);
        let bad = UpdateOrderPayload { status: "lost".into() };
        assert!(bad.validate().is_err());
    }
}
