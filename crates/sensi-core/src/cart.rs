//! Per-session shopping cart.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::catalog::Product;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartItem {
    #[serde(flatten)]
    pub product: Product,
    pub quantity: u32,
}

impl CartItem {
    pub fn line_total(&self) -> f64 {
        self.product.price * f64::from(self.quantity)
    }
}

/// Cart keyed by product id. No entry ever has quantity zero.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    items: BTreeMap<String, CartItem>,
}

/// Serializable snapshot with derived totals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub items: Vec<CartItem>,
    pub item_count: u32,
    pub total: f64,
}

impl Cart {
    /// Adds one unit; an existing entry is incremented.
    pub fn add(&mut self, product: &Product) -> &CartItem {
        self.items
            .entry(product.id.clone())
            .and_modify(|item| item.quantity += 1)
            .or_insert_with(|| CartItem {
                product: product.clone(),
                quantity: 1,
            })
    }

    /// Drops the whole entry regardless of quantity.
    pub fn remove(&mut self, product_id: &str) -> Option<CartItem> {
        self.items.remove(product_id)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> impl Iterator<Item = &CartItem> {
        self.items.values()
    }

    pub fn total(&self) -> f64 {
        self.items.values().map(CartItem::line_total).sum()
    }

    pub fn item_count(&self) -> u32 {
        self.items.values().map(|i| i.quantity).sum()
    }

    pub fn summary(&self) -> CartSummary {
        CartSummary {
            items: self.items.values().cloned().collect(),
            item_count: self.item_count(),
            total: self.total(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    #[test]
    fn same_product_twice_is_one_entry() {
        let catalog = Catalog::default();
        let gold = catalog.get("android-gold").unwrap();
        let mut cart = Cart::default();
        cart.add(gold);
        cart.add(gold);
        let items: Vec<_> = cart.items().collect();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 2);
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn total_and_remove() {
        let catalog = Catalog::default();
        let mut cart = Cart::default();
        cart.add(catalog.get("android-silver").unwrap());
        cart.add(catalog.get("android-silver").unwrap());
        cart.add(catalog.get("pc-gold").unwrap());
        assert_eq!(cart.total(), 300.0 * 2.0 + 1500.0);

        let removed = cart.remove("android-silver").unwrap();
        assert_eq!(removed.quantity, 2);
        assert!(cart.items().all(|i| i.product.id != "android-silver" && i.quantity > 0));
        assert_eq!(cart.total(), 1500.0);
        assert!(cart.remove("android-silver").is_none());
    }

    #[test]
    fn summary_serializes_flat_items() {
        let catalog = Catalog::default();
        let mut cart = Cart::default();
        cart.add(catalog.get("ios-gold").unwrap());
        let json = serde_json::to_value(cart.summary()).unwrap();
        assert_eq!(json["itemCount"], 1);
        assert_eq!(json["items"][0]["id"], "ios-gold");
        assert_eq!(json["items"][0]["quantity"], 1);
    }
}
