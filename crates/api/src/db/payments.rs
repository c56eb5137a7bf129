//! Payment queries.

use async_trait::async_trait;

use executive_core::OrderStatus;

use super::{PaymentStore, PgStore, RepositoryError, map_write_error};
use crate::models::Payment;

#[async_trait]
impl PaymentStore for PgStore {
    async fn record_payment(
        &self,
        payment: &Payment,
        mark_order_paid: bool,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"
            INSERT INTO payments
                (id, order_id, amount, provider, status, checkout_request_id,
                 merchant_request_id, receipt, phone, metadata, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ",
        )
        .bind(payment.id)
        .bind(payment.order_id)
        .bind(payment.amount)
        .bind(&payment.provider)
        .bind(payment.status)
        .bind(&payment.checkout_request_id)
        .bind(&payment.merchant_request_id)
        .bind(&payment.receipt)
        .bind(&payment.phone)
        .bind(&payment.metadata)
        .bind(payment.created_at)
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;

        if mark_order_paid {
            let result = sqlx::query("UPDATE orders SET status = $2, updated_at = $3 WHERE id = $1")
                .bind(payment.order_id)
                .bind(OrderStatus::Paid)
                .bind(payment.created_at)
                .execute(&mut *tx)
                .await?;
            if result.rows_affected() == 0 {
                return Err(RepositoryError::NotFound);
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn payment_by_checkout_id(
        &self,
        checkout_request_id: &str,
    ) -> Result<Option<Payment>, RepositoryError> {
        let row = sqlx::query_as::<_, Payment>(
            r"
            SELECT id, order_id, amount, provider, status, checkout_request_id,
                   merchant_request_id, receipt, phone, metadata, created_at
            FROM payments
            WHERE checkout_request_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            ",
        )
        .bind(checkout_request_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}
