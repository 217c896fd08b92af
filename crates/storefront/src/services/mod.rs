//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `guest_cart` - Session persistence for signed-out visitors' carts
//! - `cart` - Hydration, pricing lines, and the merge-on-sign-in flow

pub mod cart;
pub mod guest_cart;

pub use cart::{
    GuestCartLine, MergeOutcome, hydrate_guest_cart, line_items_from_entries,
    line_items_from_guest, merge_guest_cart, order_items_from_entries, order_items_from_guest,
};
pub use guest_cart::{clear_guest_cart, load_guest_cart, save_guest_cart};
