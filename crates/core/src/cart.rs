//! Guest cart held in the visitor session before sign-in.
//!
//! Signed-out visitors build their cart entirely in session state; nothing
//! touches the backend until they authenticate, at which point the entries
//! are replayed against the server cart. This module is the pure collection;
//! session persistence and the merge live in the storefront.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::ProductId;

/// One line in the guest cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestCartItem {
    /// Entry id minted when the line was first added. Distinct from the
    /// product id so a line survives product-level edits.
    pub id: Uuid,
    pub product_id: ProductId,
    pub quantity: u32,
    /// Set when the product was added from a themed collection page, e.g.
    /// `"explore_singapore"`. Forwarded on merge; the backend's stored cart
    /// row does not keep it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_type: Option<String>,
}

/// An ordered guest cart.
///
/// Adding a product that is already present merges into the existing line
/// by summing quantities, so the cart never holds two lines for the same
/// product. Quantities are at least 1 by construction; dropping a line is
/// an explicit [`remove`](Self::remove), never a zero quantity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuestCart {
    items: Vec<GuestCartItem>,
}

impl GuestCart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[GuestCartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Total units across all lines, for the header badge.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.items
            .iter()
            .fold(0, |sum, item| sum.saturating_add(item.quantity))
    }

    /// Add `quantity` units of a product, merging into an existing line for
    /// the same product when there is one. Returns the id of the line the
    /// units landed in.
    pub fn add(
        &mut self,
        product_id: ProductId,
        quantity: NonZeroU32,
        collection_type: Option<String>,
    ) -> Uuid {
        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|item| item.product_id == product_id)
        {
            existing.quantity = existing.quantity.saturating_add(quantity.get());
            return existing.id;
        }

        let item = GuestCartItem {
            id: Uuid::new_v4(),
            product_id,
            quantity: quantity.get(),
            collection_type,
        };
        let id = item.id;
        self.items.push(item);
        id
    }

    /// Set the quantity of an existing line. Returns `false` when no line
    /// has the given id.
    pub fn set_quantity(&mut self, id: Uuid, quantity: NonZeroU32) -> bool {
        match self.items.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                item.quantity = quantity.get();
                true
            }
            None => false,
        }
    }

    /// Remove a line. Returns `false` when no line has the given id.
    pub fn remove(&mut self, id: Uuid) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        self.items.len() < before
    }

    /// Remove several lines at once, e.g. the ones that merged into the
    /// server cart on sign-in.
    pub fn remove_many(&mut self, ids: &[Uuid]) {
        self.items.retain(|item| !ids.contains(&item.id));
    }

    /// Drop every line.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn qty(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    #[test]
    fn test_add_new_products_appends_in_order() {
        let mut cart = GuestCart::new();
        cart.add(ProductId::new("p-1"), qty(1), None);
        cart.add(ProductId::new("p-2"), qty(2), None);

        let products: Vec<&str> = cart
            .items()
            .iter()
            .map(|item| item.product_id.as_str())
            .collect();
        assert_eq!(products, vec!["p-1", "p-2"]);
    }

    #[test]
    fn test_add_same_product_merges_quantities() {
        let mut cart = GuestCart::new();
        let first = cart.add(ProductId::new("p-1"), qty(1), None);
        let second = cart.add(ProductId::new("p-1"), qty(3), None);

        assert_eq!(first, second);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.items()[0].quantity, 4);
    }

    #[test]
    fn test_merge_ignores_collection_type() {
        let mut cart = GuestCart::new();
        cart.add(ProductId::new("p-1"), qty(1), None);
        cart.add(
            ProductId::new("p-1"),
            qty(1),
            Some("explore_singapore".to_owned()),
        );

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.items()[0].quantity, 2);
    }

    #[test]
    fn test_set_quantity() {
        let mut cart = GuestCart::new();
        let id = cart.add(ProductId::new("p-1"), qty(1), None);

        assert!(cart.set_quantity(id, qty(5)));
        assert_eq!(cart.items()[0].quantity, 5);

        assert!(!cart.set_quantity(Uuid::new_v4(), qty(1)));
    }

    #[test]
    fn test_remove() {
        let mut cart = GuestCart::new();
        let id = cart.add(ProductId::new("p-1"), qty(1), None);
        cart.add(ProductId::new("p-2"), qty(1), None);

        assert!(cart.remove(id));
        assert!(!cart.remove(id));
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.items()[0].product_id.as_str(), "p-2");
    }

    #[test]
    fn test_remove_many() {
        let mut cart = GuestCart::new();
        let a = cart.add(ProductId::new("p-1"), qty(1), None);
        cart.add(ProductId::new("p-2"), qty(1), None);
        let c = cart.add(ProductId::new("p-3"), qty(1), None);

        cart.remove_many(&[a, c]);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.items()[0].product_id.as_str(), "p-2");
    }

    #[test]
    fn test_total_quantity() {
        let mut cart = GuestCart::new();
        cart.add(ProductId::new("p-1"), qty(2), None);
        cart.add(ProductId::new("p-2"), qty(3), None);

        assert_eq!(cart.total_quantity(), 5);
    }

    #[test]
    fn test_clear() {
        let mut cart = GuestCart::new();
        cart.add(ProductId::new("p-1"), qty(1), None);
        cart.clear();

        assert!(cart.is_empty());
        assert_eq!(cart.total_quantity(), 0);
    }

    #[test]
    fn test_serde_roundtrip() {
        let mut cart = GuestCart::new();
        cart.add(ProductId::new("p-1"), qty(2), None);
        cart.add(
            ProductId::new("p-2"),
            qty(1),
            Some("explore_singapore".to_owned()),
        );

        let json = serde_json::to_string(&cart).unwrap();
        let parsed: GuestCart = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, cart);

        // A cart serializes as a bare array, and lines without a collection
        // omit the field entirely.
        assert!(json.starts_with('['));
        assert_eq!(json.matches("collection_type").count(), 1);
    }
}
