//! Persistence for the commerce API.
//!
//! # Stores
//!
//! Every entity gets its own capability trait (`UserStore`, `OrderStore`, ...)
//! so services can ask for exactly what they touch. [`Store`] bundles them all
//! and is what [`AppState`](crate::state::AppState) holds.
//!
//! - [`PgStore`] - the `PostgreSQL` adapter used in production
//! - `MemoryStore` - an in-process adapter (`memory-store` feature / tests)
//!
//! # Migrations
//!
//! Migrations live in `crates/api/migrations/` and are run via:
//! ```bash
//! cargo run -p executive-cli -- migrate
//! ```

mod addresses;
mod carts;
mod categories;
#[cfg(any(test, feature = "memory-store"))]
mod memory;
mod orders;
mod payments;
mod products;
mod reviews;
mod users;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use executive_core::{
    AddressId, CartId, CategoryId, Email, OrderId, OrderStatus, ProductId, ReviewId, UserId,
};

#[cfg(any(test, feature = "memory-store"))]
pub use memory::MemoryStore;

use crate::models::{
    Address, Cart, CartItem, Category, Order, OrderItem, OrderItemDetailed, Payment, Product,
    Review, User,
};

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Unique constraint violation (e.g., duplicate email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A referenced row does not exist (foreign key violation).
    #[error("invalid reference: {0}")]
    InvalidReference(String),
}

/// Classify constraint violations; everything else stays a database error.
pub(crate) fn map_write_error(err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict(
                db_err.constraint().unwrap_or("unique").to_owned(),
            );
        }
        if db_err.is_foreign_key_violation() {
            return RepositoryError::InvalidReference(
                db_err.constraint().unwrap_or("foreign key").to_owned(),
            );
        }
    }
    RepositoryError::Database(err)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// # Errors
    ///
    /// `Conflict` if the email is already registered.
    async fn create_user(&self, user: &User) -> Result<(), RepositoryError>;
    async fn user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;
    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
}

#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn create_category(&self, category: &Category) -> Result<(), RepositoryError>;
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError>;
    async fn category_by_id(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError>;
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    /// # Errors
    ///
    /// `InvalidReference` if the category does not exist.
    async fn create_product(&self, product: &Product) -> Result<(), RepositoryError>;
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError>;
    async fn product_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;
    /// # Errors
    ///
    /// `NotFound` if no row has `product.id`.
    async fn update_product(&self, product: &Product) -> Result<(), RepositoryError>;
    /// # Errors
    ///
    /// `NotFound` if no row has `id`.
    async fn delete_product(&self, id: ProductId) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait CartStore: Send + Sync {
    async fn cart_for_user(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError>;
    /// Return the user's cart, inserting `candidate` if they have none yet.
    async fn ensure_cart(&self, candidate: &Cart) -> Result<Cart, RepositoryError>;
    /// # Errors
    ///
    /// `InvalidReference` if the product or cart does not exist.
    async fn add_cart_item(&self, item: &CartItem) -> Result<(), RepositoryError>;
    async fn cart_items(&self, cart_id: CartId) -> Result<Vec<CartItem>, RepositoryError>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert the order and all its items in one transaction.
    ///
    /// # Errors
    ///
    /// `InvalidReference` if any item names an unknown product; nothing is
    /// persisted in that case.
    async fn create_order_with_items(
        &self,
        order: &Order,
        items: &[OrderItem],
    ) -> Result<(), RepositoryError>;
    /// Newest first.
    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError>;
    async fn order_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError>;
    async fn order_items_detailed(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<OrderItemDetailed>, RepositoryError>;
    /// # Errors
    ///
    /// `NotFound` if no order has `id`.
    async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<Order, RepositoryError>;
}

#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// # Errors
    ///
    /// `InvalidReference` if the product does not exist.
    async fn create_review(&self, review: &Review) -> Result<(), RepositoryError>;
    async fn review_by_id(&self, id: ReviewId) -> Result<Option<Review>, RepositoryError>;
    /// Newest first.
    async fn reviews_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Review>, RepositoryError>;
    /// # Errors
    ///
    /// `NotFound` if no review with this id belongs to `review.user_id`.
    async fn update_review(&self, review: &Review) -> Result<(), RepositoryError>;
    /// # Errors
    ///
    /// `NotFound` if no review with this id belongs to `user_id`.
    async fn delete_review(&self, id: ReviewId, user_id: UserId) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait AddressStore: Send + Sync {
    async fn create_address(&self, address: &Address) -> Result<(), RepositoryError>;
    /// The user's most recently created address.
    async fn current_address(&self, user_id: UserId) -> Result<Option<Address>, RepositoryError>;
    async fn address_by_id(&self, id: AddressId) -> Result<Option<Address>, RepositoryError>;
    /// # Errors
    ///
    /// `NotFound` if no address with this id belongs to `address.user_id`.
    async fn update_address(&self, address: &Address) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Insert `payment` and, when `mark_order_paid` is set, move its order to
    /// `paid`, in one transaction.
    ///
    /// # Errors
    ///
    /// `NotFound` if the order disappeared; the payment row is rolled back.
    async fn record_payment(
        &self,
        payment: &Payment,
        mark_order_paid: bool,
    ) -> Result<(), RepositoryError>;
    async fn payment_by_checkout_id(
        &self,
        checkout_request_id: &str,
    ) -> Result<Option<Payment>, RepositoryError>;
}

/// Every store capability plus a liveness check.
#[async_trait]
pub trait Store:
    UserStore
    + CategoryStore
    + ProductStore
    + CartStore
    + OrderStore
    + ReviewStore
    + AddressStore
    + PaymentStore
{
    /// Check that the backing database answers.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// `PostgreSQL` implementation of every store trait.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
