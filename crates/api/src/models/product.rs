//! Catalog products.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use executive_core::{CategoryId, ProductId, require_positive};

use super::{ValidationError, require_text};

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub price: Decimal,
    pub image: String,
    pub category_id: CategoryId,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /products` and `PUT /products/{id}`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ProductPayload {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    #[schema(value_type = f64)]
    pub price: Decimal,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub category_id: String,
    #[serde(default)]
    pub quantity: i32,
}

/// Product fields after validation. The category still has to be checked
/// against the store.
#[derive(Debug, Clone)]
pub struct ProductFields {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub image: String,
    pub category_id: CategoryId,
    pub quantity: i32,
}

impl ProductPayload {
    /// # Errors
    ///
    /// Returns `ValidationError` for a blank name, a non-positive price, a
    /// negative quantity, or a `category_id` that is not a UUID.
    pub fn validate(self) -> Result<ProductFields, ValidationError> {
        let name = require_text("name", &self.name)?;
        let price = require_positive("price", self.price)?;
        if self.quantity < 0 {
            return Err(ValidationError::new("quantity cannot be negative"));
        }
        let category_id = CategoryId::parse(&self.category_id)
            .map_err(|_| ValidationError::new("category_id must be a valid id"))?;
        Ok(ProductFields {
            name,
            description: self.description,
            price,
            image: self.image,
            category_id,
            quantity: self.quantity,
        })
    }
}

impl ProductFields {
    #[must_use]
    pub fn into_new_product(self, now: DateTime<Utc>) -> Product {
        Product {
            id: ProductId::generate(),
            name: self.name,
            description: self.description,
            price: self.price,
            image: self.image,
            category_id: self.category_id,
            quantity: self.quantity,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite every editable field of `existing`.
    #[must_use]
    pub fn apply_to(self, existing: Product, now: DateTime<Utc>) -> Product {
        Product {
            name: self.name,
            description: self.description,
            price: self.price,
            image: self.image,
            category_id: self.category_id,
            quantity: self.quantity,
            updated_at: now,
            ..existing
        }
    }
}
