//! Payment bridge webhook.
//!
//! Both endpoints authenticate with the `X-Node-Notify-Secret` header instead
//! of a user token.

use axum::extract::State;
use serde::Serialize;
use utoipa::ToSchema;

use super::{Json, Path};
use crate::db::PaymentStore;
use crate::error::{AppError, ErrorBody, Result};
use crate::middleware::NotifySecret;
use crate::models::{Payment, PaymentConfirmation};
use crate::services::PaymentService;
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct Acknowledged {
    #[schema(value_type = String, example = "ok")]
    pub status: &'static str,
}

/// POST /api/v1/payments/confirm
///
/// # Errors
///
/// 401 for a bad secret, 400 for a bad order id or amount mismatch, 404 for
/// an unknown order.
#[utoipa::path(
    post,
    path = "/api/v1/payments/confirm",
    operation_id = "confirm_payment",
    tag = "payments",
    request_body = PaymentConfirmation,
    responses(
        (status = 200, description = "Payment recorded", body = Acknowledged),
        (status = 400, description = "Bad order id or amount mismatch", body = ErrorBody),
        (status = 401, description = "Bad notify secret", body = ErrorBody),
        (status = 404, description = "Unknown order", body = ErrorBody),
    ),
    security(("notify_secret" = [])),
)]
pub async fn confirm(
    State(state): State<AppState>,
    _secret: NotifySecret,
    Json(confirmation): Json<PaymentConfirmation>,
) -> Result<Json<Acknowledged>> {
    PaymentService::new(state.store())
        .confirm(confirmation)
        .await?;
    Ok(Json(Acknowledged { status: "ok" }))
}

/// GET /api/v1/payments/checkout/{checkout_request_id}
///
/// # Errors
///
/// 401 for a bad secret, 404 if no payment was recorded for this checkout.
#[utoipa::path(
    get,
    path = "/api/v1/payments/checkout/{checkout_request_id}",
    operation_id = "payment_by_checkout_id",
    tag = "payments",
    params((
        "checkout_request_id" = String,
        Path,
        description = "Provider checkout request id"
    )),
    responses(
        (status = 200, description = "Recorded payment", body = Payment),
        (status = 401, description = "Bad notify secret", body = ErrorBody),
        (status = 404, description = "No payment for this checkout", body = ErrorBody),
    ),
    security(("notify_secret" = [])),
)]
pub async fn by_checkout_id(
    State(state): State<AppState>,
    _secret: NotifySecret,
    Path(checkout_request_id): Path<String>,
) -> Result<Json<Payment>> {
    let payment = state
        .store()
        .payment_by_checkout_id(&checkout_request_id)
        .await?
        .ok_or_else(|| AppError::NotFound("payment not found".to_string()))?;
    Ok(Json(payment))
}
