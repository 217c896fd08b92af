//! Merlion Gifts Core - Shared domain library.
//!
//! This crate provides the domain types and pure business logic shared by
//! all Merlion Gifts components:
//! - `storefront` - Public-facing e-commerce site
//! - `admin` - Internal administration console
//! - `cli` - Command-line tools for ops checks and catalog seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no session access. Everything that talks to the backend API
//! lives in the binaries; everything here is deterministic and unit-tested
//! in isolation.
//!
//! # Modules
//!
//! - [`currency`] - Display-currency conversion against the fixed rate table
//! - [`cart`] - The guest cart carried in the visitor session before sign-in
//! - [`checkout`] - Order totals and coupon application
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod currency;
pub mod types;

pub use cart::{GuestCart, GuestCartItem};
pub use checkout::{CheckoutSummary, Coupon, CouponError, DiscountType, LineItem};
pub use currency::CurrencyCode;
pub use types::*;
