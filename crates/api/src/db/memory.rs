//! In-process store used by tests and local experiments.
//!
//! Mirrors the constraints the `PostgreSQL` schema enforces (unique email,
//! foreign keys, one cart per user) so handler behavior matches production.
//! Each method holds the lock for its whole body, which gives the same
//! all-or-nothing outcome as the transactional SQL paths.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use executive_core::{
    AddressId, CartId, CategoryId, Email, OrderId, OrderStatus, ProductId, ReviewId, UserId,
};

use super::{
    AddressStore, CartStore, CategoryStore, OrderStore, PaymentStore, ProductStore,
    RepositoryError, ReviewStore, Store, UserStore,
};
use crate::models::{
    Address, Cart, CartItem, Category, Order, OrderItem, OrderItemDetailed, Payment, Product,
    Review, User,
};

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, User>,
    categories: Vec<Category>,
    products: Vec<Product>,
    carts: Vec<Cart>,
    cart_items: Vec<CartItem>,
    orders: Vec<Order>,
    order_items: Vec<OrderItem>,
    reviews: Vec<Review>,
    addresses: Vec<Address>,
    payments: Vec<Payment>,
}

impl Tables {
    fn product_exists(&self, id: ProductId) -> bool {
        self.products.iter().any(|p| p.id == id)
    }
}

/// Newest first; rows with equal timestamps keep reverse insertion order.
fn newest_first<T>(
    rows: impl DoubleEndedIterator<Item = T>,
    at: impl Fn(&T) -> DateTime<Utc>,
) -> Vec<T> {
    let mut out: Vec<T> = rows.rev().collect();
    out.sort_by_key(|row| std::cmp::Reverse(at(row)));
    out
}

fn missing(what: &str) -> RepositoryError {
    RepositoryError::InvalidReference(format!("{what} does not exist"))
}

/// Memory-backed implementation of every store trait.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored payments. Lets tests assert nothing was persisted.
    #[must_use]
    pub fn payment_count(&self) -> usize {
        self.tables.lock().payments.len()
    }

    /// Number of stored orders.
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.tables.lock().orders.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: &User) -> Result<(), RepositoryError> {
        let mut t = self.tables.lock();
        if t.users.values().any(|u| u.email == user.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }
        t.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let t = self.tables.lock();
        Ok(t.users.values().find(|u| &u.email == email).cloned())
    }

    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.tables.lock().users.get(&id).cloned())
    }
}

#[async_trait]
impl CategoryStore for MemoryStore {
    async fn create_category(&self, category: &Category) -> Result<(), RepositoryError> {
        self.tables.lock().categories.push(category.clone());
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let mut rows = self.tables.lock().categories.clone();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn category_by_id(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let t = self.tables.lock();
        Ok(t.categories.iter().find(|c| c.id == id).cloned())
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn create_product(&self, product: &Product) -> Result<(), RepositoryError> {
        let mut t = self.tables.lock();
        if !t.categories.iter().any(|c| c.id == product.category_id) {
            return Err(missing("category"));
        }
        t.products.push(product.clone());
        Ok(())
    }

    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let t = self.tables.lock();
        Ok(newest_first(t.products.iter().cloned(), |p| p.created_at))
    }

    async fn product_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let t = self.tables.lock();
        Ok(t.products.iter().find(|p| p.id == id).cloned())
    }

    async fn update_product(&self, product: &Product) -> Result<(), RepositoryError> {
        let mut t = self.tables.lock();
        if !t.categories.iter().any(|c| c.id == product.category_id) {
            return Err(missing("category"));
        }
        let row = t
            .products
            .iter_mut()
            .find(|p| p.id == product.id)
            .ok_or(RepositoryError::NotFound)?;
        *row = product.clone();
        Ok(())
    }

    async fn delete_product(&self, id: ProductId) -> Result<(), RepositoryError> {
        let mut t = self.tables.lock();
        if !t.product_exists(id) {
            return Err(RepositoryError::NotFound);
        }
        // order_items keep their product; cart items and reviews cascade.
        if t.order_items.iter().any(|i| i.product_id == id) {
            return Err(RepositoryError::InvalidReference(
                "product is referenced by an order".to_owned(),
            ));
        }
        t.products.retain(|p| p.id != id);
        t.cart_items.retain(|i| i.product_id != id);
        t.reviews.retain(|r| r.product_id != id);
        Ok(())
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn cart_for_user(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        let t = self.tables.lock();
        Ok(t.carts.iter().find(|c| c.user_id == user_id).cloned())
    }

    async fn ensure_cart(&self, candidate: &Cart) -> Result<Cart, RepositoryError> {
        let mut t = self.tables.lock();
        if let Some(existing) = t.carts.iter().find(|c| c.user_id == candidate.user_id) {
            return Ok(existing.clone());
        }
        if !t.users.contains_key(&candidate.user_id) {
            return Err(missing("user"));
        }
        t.carts.push(candidate.clone());
        Ok(candidate.clone())
    }

    async fn add_cart_item(&self, item: &CartItem) -> Result<(), RepositoryError> {
        let mut t = self.tables.lock();
        if !t.carts.iter().any(|c| c.id == item.cart_id) {
            return Err(missing("cart"));
        }
        if !t.product_exists(item.product_id) {
            return Err(missing("product"));
        }
        t.cart_items.push(item.clone());
        Ok(())
    }

    async fn cart_items(&self, cart_id: CartId) -> Result<Vec<CartItem>, RepositoryError> {
        let t = self.tables.lock();
        Ok(t.cart_items
            .iter()
            .filter(|i| i.cart_id == cart_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn create_order_with_items(
        &self,
        order: &Order,
        items: &[OrderItem],
    ) -> Result<(), RepositoryError> {
        let mut t = self.tables.lock();
        if !t.users.contains_key(&order.user_id) {
            return Err(missing("user"));
        }
        if !t.addresses.iter().any(|a| a.id == order.address_id) {
            return Err(missing("address"));
        }
        if items.iter().any(|i| !t.product_exists(i.product_id)) {
            return Err(missing("product"));
        }
        t.orders.push(order.clone());
        t.order_items.extend_from_slice(items);
        Ok(())
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let t = self.tables.lock();
        Ok(newest_first(
            t.orders.iter().filter(|o| o.user_id == user_id).cloned(),
            |o| o.created_at,
        ))
    }

    async fn order_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let t = self.tables.lock();
        Ok(t.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn order_items_detailed(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<OrderItemDetailed>, RepositoryError> {
        let t = self.tables.lock();
        let mut rows: Vec<OrderItemDetailed> = t
            .order_items
            .iter()
            .filter(|i| i.order_id == order_id)
            .filter_map(|i| {
                let product = t.products.iter().find(|p| p.id == i.product_id)?;
                Some(OrderItemDetailed {
                    id: i.id,
                    product_id: i.product_id,
                    product_name: product.name.clone(),
                    quantity: i.quantity,
                    price: i.price,
                })
            })
            .collect();
        rows.sort_by(|a, b| a.product_name.cmp(&b.product_name));
        Ok(rows)
    }

    async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<Order, RepositoryError> {
        let mut t = self.tables.lock();
        let order = t
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(RepositoryError::NotFound)?;
        order.status = status;
        order.updated_at = now;
        Ok(order.clone())
    }
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn create_review(&self, review: &Review) -> Result<(), RepositoryError> {
        let mut t = self.tables.lock();
        if !t.product_exists(review.product_id) {
            return Err(missing("product"));
        }
        t.reviews.push(review.clone());
        Ok(())
    }

    async fn review_by_id(&self, id: ReviewId) -> Result<Option<Review>, RepositoryError> {
        let t = self.tables.lock();
        Ok(t.reviews.iter().find(|r| r.id == id).cloned())
    }

    async fn reviews_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Review>, RepositoryError> {
        let t = self.tables.lock();
        Ok(newest_first(
            t.reviews.iter().filter(|r| r.product_id == product_id).cloned(),
            |r| r.created_at,
        ))
    }

    async fn update_review(&self, review: &Review) -> Result<(), RepositoryError> {
        let mut t = self.tables.lock();
        let row = t
            .reviews
            .iter_mut()
            .find(|r| r.id == review.id && r.user_id == review.user_id)
            .ok_or(RepositoryError::NotFound)?;
        *row = review.clone();
        Ok(())
    }

    async fn delete_review(&self, id: ReviewId, user_id: UserId) -> Result<(), RepositoryError> {
        let mut t = self.tables.lock();
        let before = t.reviews.len();
        t.reviews.retain(|r| !(r.id == id && r.user_id == user_id));
        if t.reviews.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl AddressStore for MemoryStore {
    async fn create_address(&self, address: &Address) -> Result<(), RepositoryError> {
        let mut t = self.tables.lock();
        if !t.users.contains_key(&address.user_id) {
            return Err(missing("user"));
        }
        t.addresses.push(address.clone());
        Ok(())
    }

    async fn current_address(&self, user_id: UserId) -> Result<Option<Address>, RepositoryError> {
        let t = self.tables.lock();
        Ok(newest_first(
            t.addresses.iter().filter(|a| a.user_id == user_id).cloned(),
            |a| a.created_at,
        )
        .into_iter()
        .next())
    }

    async fn address_by_id(&self, id: AddressId) -> Result<Option<Address>, RepositoryError> {
        let t = self.tables.lock();
        Ok(t.addresses.iter().find(|a| a.id == id).cloned())
    }

    async fn update_address(&self, address: &Address) -> Result<(), RepositoryError> {
        let mut t = self.tables.lock();
        let row = t
            .addresses
            .iter_mut()
            .find(|a| a.id == address.id && a.user_id == address.user_id)
            .ok_or(RepositoryError::NotFound)?;
        *row = address.clone();
        Ok(())
    }
}

#[async_trait]
impl PaymentStore for MemoryStore {
    async fn record_payment(
        &self,
        payment: &Payment,
        mark_order_paid: bool,
    ) -> Result<(), RepositoryError> {
        let mut t = self.tables.lock();
        let order = t
            .orders
            .iter_mut()
            .find(|o| o.id == payment.order_id)
            .ok_or_else(|| missing("order"))?;
        if mark_order_paid {
            order.status = OrderStatus::Paid;
            order.updated_at = payment.created_at;
        }
        t.payments.push(payment.clone());
        Ok(())
    }

    async fn payment_by_checkout_id(
        &self,
        checkout_request_id: &str,
    ) -> Result<Option<Payment>, RepositoryError> {
        let t = self.tables.lock();
        Ok(t.payments
            .iter()
            .rev()
            .find(|p| p.checkout_request_id == checkout_request_id)
            .cloned())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
