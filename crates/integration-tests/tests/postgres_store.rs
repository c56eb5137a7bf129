//! `PgStore` against a real database.
//!
//! These tests require:
//! - A running `PostgreSQL` database reachable via `DATABASE_URL`
//!   (or `EXECUTIVE_DATABASE_URL`); migrations are applied on connect
//!
//! Run with: `cargo test -p executive-integration-tests --test postgres_store -- --ignored`

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::str::FromStr;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use executive_api::db::{
    AddressStore, CartStore, CategoryStore, OrderStore, PaymentStore, PgStore, ProductStore,
    RepositoryError, ReviewStore, UserStore,
};
use executive_api::models::{
    Address, Cart, Category, CreateOrderItem, CreateOrderPayload, PaymentConfirmation, Product,
    Review, User,
};
use executive_api::services::checkout::CheckoutError;
use executive_api::services::payments::PaymentError;
use executive_api::services::{CheckoutService, PaymentService};
use executive_core::{
    AddressId, CartId, CategoryId, Email, OrderStatus, PaymentStatus, ProductId, Rating,
    ReviewId, UserId,
};

const MIGRATIONS: [&str; 3] = [
    include_str!("../../api/migrations/20250101000001_users_catalog.sql"),
    include_str!("../../api/migrations/20250101000002_carts_reviews.sql"),
    include_str!("../../api/migrations/20250101000003_orders_payments.sql"),
];

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

async fn store() -> PgStore {
    let url = std::env::var("EXECUTIVE_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("Failed to connect to database");
    sqlx::migrate!("../api/migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    PgStore::new(pool)
}

async fn user(store: &PgStore) -> User {
    let now = Utc::now();
    let user = User {
        id: UserId::generate(),
        name: "Wanjiru".to_string(),
        email: Email::parse(&format!("pg-{}@example.com", Uuid::new_v4().simple())).unwrap(),
        password_hash: "not-a-real-hash".to_string(),
        created_at: now,
        updated_at: now,
    };
    store.create_user(&user).await.unwrap();
    user
}

async fn product(store: &PgStore, price: &str) -> Product {
    let now = Utc::now();
    let category = Category {
        id: CategoryId::generate(),
        name: "Lighting".to_string(),
        created_at: now,
    };
    store.create_category(&category).await.unwrap();

    let product = Product {
        id: ProductId::generate(),
        name: "Desk lamp".to_string(),
        description: String::new(),
        price: dec(price),
        image: String::new(),
        category_id: category.id,
        quantity: 10,
        created_at: now,
        updated_at: now,
    };
    store.create_product(&product).await.unwrap();
    product
}

async fn address(store: &PgStore, user_id: UserId) {
    let address = Address {
        id: AddressId::generate(),
        user_id,
        line1: "Moi Avenue 4".to_string(),
        line2: String::new(),
        city: "Nairobi".to_string(),
        country: "KE".to_string(),
        zip_code: "00100".to_string(),
        created_at: Utc::now(),
    };
    store.create_address(&address).await.unwrap();
}

fn order_of(lines: &[(ProductId, i32, &str)]) -> CreateOrderPayload {
    CreateOrderPayload {
        items: lines
            .iter()
            .map(|&(product_id, quantity, price)| CreateOrderItem {
                product_id,
                quantity,
                price: dec(price),
            })
            .collect(),
    }
}

fn confirmation(order_id: &str, amount: Decimal, checkout: &str) -> PaymentConfirmation {
    PaymentConfirmation {
        order_id: order_id.to_string(),
        status: PaymentStatus::Success,
        amount,
        provider: "mpesa".to_string(),
        checkout_request_id: checkout.to_string(),
        merchant_request_id: String::new(),
        receipt: "QKX12".to_string(),
        phone: "254700000000".to_string(),
        metadata: serde_json::json!({"ResultCode": 0}),
    }
}

#[test]
fn test_money_columns_are_unscaled() {
    for sql in MIGRATIONS {
        assert!(!sql.contains("NUMERIC("), "scaled money column in:\n{sql}");
    }
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_order_total_round_trips_exactly() {
    let store = store().await;
    let buyer = user(&store).await;
    let lamp = product(&store, "1.155").await;
    address(&store, buyer.id).await;

    let placed = CheckoutService::new(&store)
        .place_order(buyer.id, &order_of(&[(lamp.id, 3, "1.155")]))
        .await
        .unwrap();
    assert_eq!(placed.total, dec("3.465"));

    let stored = store.order_by_id(placed.id).await.unwrap().unwrap();
    assert_eq!(stored.total, placed.total);

    let items = store.order_items_detailed(placed.id).await.unwrap();
    assert_eq!(items[0].price, dec("1.155"));
    assert_eq!(store.product_by_id(lamp.id).await.unwrap().unwrap().price, dec("1.155"));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_sub_cent_and_large_amounts_are_stored() {
    let store = store().await;
    let buyer = user(&store).await;
    let cheap = product(&store, "0.004").await;
    let dear = product(&store, "12345678901.25").await;
    address(&store, buyer.id).await;

    let checkout = CheckoutService::new(&store);
    let small = checkout
        .place_order(buyer.id, &order_of(&[(cheap.id, 1, "0.004")]))
        .await
        .unwrap();
    let large = checkout
        .place_order(buyer.id, &order_of(&[(dear.id, 2, "12345678901.25")]))
        .await
        .unwrap();

    let small = store.order_by_id(small.id).await.unwrap().unwrap();
    let large = store.order_by_id(large.id).await.unwrap().unwrap();
    assert_eq!(small.total, dec("0.004"));
    assert_eq!(large.total, dec("24691357802.50"));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_unknown_product_rolls_back_order() {
    let store = store().await;
    let buyer = user(&store).await;
    let lamp = product(&store, "10.00").await;
    address(&store, buyer.id).await;

    let result = CheckoutService::new(&store)
        .place_order(
            buyer.id,
            &order_of(&[(lamp.id, 1, "10.00"), (ProductId::generate(), 1, "5.00")]),
        )
        .await;

    assert!(matches!(result, Err(CheckoutError::UnknownProduct)), "{result:?}");
    assert!(store.orders_for_user(buyer.id).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_payment_settles_order_with_exact_amount() {
    let store = store().await;
    let buyer = user(&store).await;
    let lamp = product(&store, "1.155").await;
    address(&store, buyer.id).await;
    let order = CheckoutService::new(&store)
        .place_order(buyer.id, &order_of(&[(lamp.id, 3, "1.155")]))
        .await
        .unwrap();
    let checkout = format!("ws_CO_{}", Uuid::new_v4().simple());
    let payments = PaymentService::new(&store);

    let rounded = payments
        .confirm(confirmation(&order.id.to_string(), dec("3.47"), &checkout))
        .await;
    assert!(matches!(rounded, Err(PaymentError::AmountMismatch { .. })), "{rounded:?}");
    assert!(store.payment_by_checkout_id(&checkout).await.unwrap().is_none());

    payments
        .confirm(confirmation(&order.id.to_string(), order.total, &checkout))
        .await
        .unwrap();

    let stored = store.order_by_id(order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Paid);
    let payment = store.payment_by_checkout_id(&checkout).await.unwrap().unwrap();
    assert_eq!(payment.amount, dec("3.465"));
    assert_eq!(payment.metadata["ResultCode"], 0);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_payment_for_missing_order_leaves_no_row() {
    let store = store().await;
    let checkout = format!("ws_CO_{}", Uuid::new_v4().simple());
    let payment = confirmation(&Uuid::new_v4().to_string(), dec("1"), &checkout);
    let order_id = payment.order_id().unwrap();

    let result = store
        .record_payment(&payment.into_payment(order_id, Utc::now()), true)
        .await;

    assert!(matches!(result, Err(RepositoryError::InvalidReference(_))), "{result:?}");
    assert!(store.payment_by_checkout_id(&checkout).await.unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_concurrent_first_adds_share_one_cart() {
    let store = store().await;
    let buyer = user(&store).await;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = store.clone();
            let candidate = Cart {
                id: CartId::generate(),
                user_id: buyer.id,
                created_at: Utc::now(),
            };
            tokio::spawn(async move { store.ensure_cart(&candidate).await })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().unwrap().id);
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 1);
    assert_eq!(store.cart_for_user(buyer.id).await.unwrap().unwrap().id, ids[0]);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_review_writes_are_owner_scoped() {
    let store = store().await;
    let author = user(&store).await;
    let other = user(&store).await;
    let lamp = product(&store, "4.50").await;
    let now = Utc::now();
    let review = Review {
        id: ReviewId::generate(),
        product_id: lamp.id,
        user_id: author.id,
        rating: Rating::new(5).unwrap(),
        comment: "bright".to_string(),
        created_at: now,
        updated_at: now,
    };
    store.create_review(&review).await.unwrap();

    let hijacked = Review {
        user_id: other.id,
        rating: Rating::new(1).unwrap(),
        comment: "dim".to_string(),
        ..review.clone()
    };
    assert!(matches!(
        store.update_review(&hijacked).await,
        Err(RepositoryError::NotFound)
    ));
    assert!(matches!(
        store.delete_review(review.id, other.id).await,
        Err(RepositoryError::NotFound)
    ));

    let unchanged = store.review_by_id(review.id).await.unwrap().unwrap();
    assert_eq!(unchanged.rating, review.rating);
    assert_eq!(unchanged.comment, "bright");

    store.delete_review(review.id, author.id).await.unwrap();
    assert!(store.review_by_id(review.id).await.unwrap().is_none());
}
