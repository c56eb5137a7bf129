//! Shopping carts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use executive_core::{CartId, CartItemId, ProductId, UserId};

use super::ValidationError;

/// One cart per user, created lazily on the first add.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// Adding the same product twice yields two line items.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartPayload {
    #[serde(default)]
    pub quantity: i32,
}

impl AddToCartPayload {
    /// # Errors
    ///
    /// Returns `ValidationError` when quantity is below 1.
    pub fn validate(&self) -> Result<i32, ValidationError> {
        if self.quantity < 1 {
            return Err(ValidationError::new("quantity must be at least 1"));
        }
        Ok(self.quantity)
    }
}
