//! Executive Core - Shared domain types.
//!
//! This crate provides the types used across the Executive components:
//! - `api` - The JSON/HTTP commerce backend
//! - `cli` - Command-line tools for migrations and catalog seeding
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no database
//! access, no HTTP. Database encoding is available behind the `postgres`
//! feature so the types can be bound directly into sqlx queries.
//!
//! # Modules
//!
//! - [`types`] - Typed ids, emails, ratings, money helpers and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
