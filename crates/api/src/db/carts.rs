//! Cart queries.

use async_trait::async_trait;

use executive_core::{CartId, UserId};

use super::{CartStore, PgStore, RepositoryError, map_write_error};
use crate::models::{Cart, CartItem};

#[async_trait]
impl CartStore for PgStore {
    async fn cart_for_user(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        let cart = sqlx::query_as::<_, Cart>(
            "SELECT id, user_id, created_at FROM carts WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(cart)
    }

    async fn ensure_cart(&self, candidate: &Cart) -> Result<Cart, RepositoryError> {
        // Concurrent first adds race on the unique user_id; the loser keeps
        // the winner's row.
        sqlx::query(
            r"
            INSERT INTO carts (id, user_id, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO NOTHING
            ",
        )
        .bind(candidate.id)
        .bind(candidate.user_id)
        .bind(candidate.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        self.cart_for_user(candidate.user_id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn add_cart_item(&self, item: &CartItem) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO cart_items (id, cart_id, product_id, quantity, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(item.id)
        .bind(item.cart_id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;
        Ok(())
    }

    async fn cart_items(&self, cart_id: CartId) -> Result<Vec<CartItem>, RepositoryError> {
        let items = sqlx::query_as::<_, CartItem>(
            r"
            SELECT id, cart_id, product_id, quantity, created_at
            FROM cart_items
            WHERE cart_id = $1
            ORDER BY created_at
            ",
        )
        .bind(cart_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }
}
