//! Order creation.
//!
//! Validates the requested lines, computes the total, resolves the buyer's
//! current address and persists the order together with its items.

use chrono::Utc;
use thiserror::Error;

use executive_core::{OrderId, OrderItemId, OrderStatus, UserId};

use crate::db::{AddressStore, OrderStore, RepositoryError};
use crate::error::AppError;
use crate::models::{CreateOrderPayload, Order, OrderItem, ValidationError};

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("{0}")]
    Invalid(#[from] ValidationError),
    #[error("no address on file")]
    NoAddress,
    #[error("order references a product that does not exist")]
    UnknownProduct,
    #[error("database error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for CheckoutError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::InvalidReference(_) => Self::UnknownProduct,
            other => Self::Repository(other),
        }
    }
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Repository(e) => Self::Database(e),
            other => Self::BadRequest(other.to_string()),
        }
    }
}

pub struct CheckoutService<'a, S: AddressStore + OrderStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: AddressStore + OrderStore + ?Sized> CheckoutService<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Place an order for `user_id`.
    ///
    /// Validation happens before any store access, so a rejected payload
    /// never touches the database.
    ///
    /// # Errors
    ///
    /// - `CheckoutError::Invalid` for an empty order or a non-positive line
    /// - `CheckoutError::NoAddress` if the user has no address on file
    /// - `CheckoutError::UnknownProduct` if a line names a missing product
    ///   (the whole order is rolled back)
    pub async fn place_order(
        &self,
        user_id: UserId,
        payload: &CreateOrderPayload,
    ) -> Result<Order, CheckoutError> {
        let total = payload.validate()?;

        let address = self
            .store
            .current_address(user_id)
            .await?
            .ok_or(CheckoutError::NoAddress)?;

        let now = Utc::now();
        let order = Order {
            id: OrderId::generate(),
            user_id,
            address_id: address.id,
            total,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        let items: Vec<OrderItem> = payload
            .items
            .iter()
            .map(|line| OrderItem {
                id: OrderItemId::generate(),
                order_id: order.id,
                product_id: line.product_id,
                quantity: line.quantity,
                price: line.price,
            })
            .collect();

        self.store.create_order_with_items(&order, &items).await?;

        tracing::info!(
            order_id = %order.id,
            user_id = %user_id,
            total = %order.total,
            items = items.len(),
            "Order placed"
        );
        Ok(order)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;

    use super::*;
    use crate::db::{CategoryStore, MemoryStore, ProductStore, UserStore};
    use crate::models::{Address, Category, CreateOrderItem, Product, User};
    use executive_core::{AddressId, CategoryId, Email, ProductId};

    async fn seeded() -> (MemoryStore, UserId, ProductId) {
        let store = MemoryStore::new();
        let now = Utc::now();
        let user = User {
            id: UserId::generate(),
            name: "Otieno".into(),
            email: Email::parse("otieno@example.com").unwrap(),
            password_hash: String::new(),
            created_at: now,
            updated_at: now,
        };
        store.create_user(&user).await.unwrap();
        let category = Category {
            id: CategoryId::generate(),
            name: "Tea".into(),
            created_at: now,
        };
        store.create_category(&category).await.unwrap();
        let product = Product {
            id: ProductId::generate(),
            name: "Kericho Gold".into(),
            description: String::new(),
            price: Decimal::from(10),
            image: String::new(),
            category_id: category.id,
            quantity: 5,
            created_at: now,
            updated_at: now,
        };
        store.create_product(&product).await.unwrap();
        (store, user.id, product.id)
    }

    async fn add_address(store: &MemoryStore, user_id: UserId) -> AddressId {
        let address = Address {
            id: AddressId::generate(),
            user_id,
            line1: "Kenyatta Ave".into(),
            line2: String::new(),
            city: "Nairobi".into(),
            country: "KE".into(),
            zip_code: "00100".into(),
            created_at: Utc::now(),
        };
        store.create_address(&address).await.unwrap();
        address.id
    }

    fn line(product_id: ProductId, quantity: i32, price: &str) -> CreateOrderItem {
        CreateOrderItem {
            product_id,
            quantity,
            price: Decimal::from_str(price).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_place_order_computes_total() {
        let (store, user, product) = seeded().await;
        let address = add_address(&store, user).await;

        let payload = CreateOrderPayload {
            items: vec![line(product, 2, "10.0"), line(product, 3, "1.15")],
        };
        let order = CheckoutService::new(&store)
            .place_order(user, &payload)
            .await
            .unwrap();

        assert_eq!(order.total, Decimal::from_str("23.45").unwrap());
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.address_id, address);
        assert_eq!(store.order_items_detailed(order.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_requires_address() {
        let (store, user, product) = seeded().await;
        let payload = CreateOrderPayload {
            items: vec![line(product, 1, "10")],
        };
        let err = CheckoutService::new(&store)
            .place_order(user, &payload)
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::NoAddress));
        assert_eq!(store.order_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_product_rolls_back() {
        let (store, user, product) = seeded().await;
        add_address(&store, user).await;
        let payload = CreateOrderPayload {
            items: vec![line(product, 1, "10"), line(ProductId::generate(), 1, "5")],
        };
        let err = CheckoutService::new(&store)
            .place_order(user, &payload)
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::UnknownProduct));
        assert_eq!(store.order_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_line_persists_nothing() {
        let (store, user, product) = seeded().await;
        add_address(&store, user).await;
        let payload = CreateOrderPayload {
            items: vec![line(product, 1, "10"), line(product, 1, "0")],
        };
        let err = CheckoutService::new(&store)
            .place_order(user, &payload)
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Invalid(_)));
        assert_eq!(store.order_count(), 0);
    }
}
