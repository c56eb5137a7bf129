//! Payment webhook reconciliation.
//!
//! The payment bridge calls back once per provider outcome. A callback is
//! accepted only when its amount matches the stored order total; a
//! `success` outcome also moves the order to `paid`.

use chrono::Utc;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::db::{OrderStore, PaymentStore, RepositoryError};
use crate::error::AppError;
use crate::models::{Payment, PaymentConfirmation, ValidationError};

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("{0}")]
    Invalid(#[from] ValidationError),
    #[error("order not found")]
    OrderNotFound,
    #[error("amount {got} does not match order total {expected}")]
    AmountMismatch { expected: Decimal, got: Decimal },
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::OrderNotFound => Self::NotFound(err.to_string()),
            PaymentError::Repository(e) => Self::Database(e),
            other => Self::BadRequest(other.to_string()),
        }
    }
}

pub struct PaymentService<'a, S: OrderStore + PaymentStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: OrderStore + PaymentStore + ?Sized> PaymentService<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Record a provider callback.
    ///
    /// Repeated callbacks each insert a payment row; the order stays `paid`.
    ///
    /// # Errors
    ///
    /// - `PaymentError::Invalid` for an unparseable order id
    /// - `PaymentError::OrderNotFound` if the order does not exist
    /// - `PaymentError::AmountMismatch` if the amount differs from the total
    ///   (nothing is persisted)
    pub async fn confirm(&self, confirmation: PaymentConfirmation) -> Result<Payment, PaymentError> {
        let order_id = confirmation.order_id()?;

        let order = self
            .store
            .order_by_id(order_id)
            .await?
            .ok_or(PaymentError::OrderNotFound)?;

        if confirmation.amount != order.total {
            tracing::warn!(
                order_id = %order_id,
                expected = %order.total,
                got = %confirmation.amount,
                "Payment amount mismatch"
            );
            return Err(PaymentError::AmountMismatch {
                expected: order.total,
                got: confirmation.amount,
            });
        }

        let payment = confirmation.into_payment(order_id, Utc::now());
        let settles = payment.status.is_success();

        self.store
            .record_payment(&payment, settles)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => PaymentError::OrderNotFound,
                other => PaymentError::Repository(other),
            })?;

        tracing::info!(
            order_id = %order_id,
            payment_id = %payment.id,
            status = %payment.status,
            provider = %payment.provider,
            "Payment recorded"
        );
        Ok(payment)
    }
}
