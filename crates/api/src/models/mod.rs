//! Domain models and request payloads.
//!
//! Each entity module holds the stored row type (`FromRow` + `Serialize`) and
//! the JSON payloads that create or change it. Payloads validate themselves;
//! handlers never see an unchecked value.

pub mod address;
pub mod cart;
pub mod category;
pub mod order;
pub mod payment;
pub mod product;
pub mod review;
pub mod user;

pub use address::{Address, AddressPayload};
pub use cart::{AddToCartPayload, Cart, CartItem};
pub use category::{Category, CreateCategoryPayload};
pub use order::{
    CreateOrderItem, CreateOrderPayload, Order, OrderItem, OrderItemDetailed, OrderWithItems,
    UpdateOrderPayload,
};
pub use payment::{Payment, PaymentConfirmation};
pub use product::{Product, ProductPayload};
pub use review::{Review, ReviewPayload};
pub use user::{LoginPayload, RegisterPayload, User};

/// A payload failed validation. Always reported to the client as 400.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

impl From<executive_core::EmailError> for ValidationError {
    fn from(err: executive_core::EmailError) -> Self {
        Self(err.to_string())
    }
}

impl From<executive_core::MoneyError> for ValidationError {
    fn from(err: executive_core::MoneyError) -> Self {
        Self(err.to_string())
    }
}

impl From<executive_core::RatingError> for ValidationError {
    fn from(err: executive_core::RatingError) -> Self {
        Self(err.to_string())
    }
}

/// Reject a blank (empty or whitespace-only) required field.
pub(crate) fn require_text(field: &str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError(format!("{field} is required")));
    }
    Ok(trimmed.to_owned())
}
