//! Core domain types for Executive.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod money;
pub mod rating;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{MoneyError, line_total, order_total, require_positive};
pub use rating::{Rating, RatingError};
pub use status::*;
