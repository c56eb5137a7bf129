//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Registration, login and bearer tokens
//! - `checkout` - Order creation (validation, totals, transactional insert)
//! - `payments` - Payment webhook reconciliation

pub mod auth;
pub mod checkout;
pub mod payments;

pub use auth::{AuthError, AuthService};
pub use checkout::CheckoutService;
pub use payments::PaymentService;
