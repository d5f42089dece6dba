use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{client::persisted::Persisted, orders::OrderItem, storage::SnapshotStore};

pub const CART_KEY: &str = "shopping_cart_items";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub item_id: i64,
    pub name: String,
    pub unit_price: Decimal,
    pub image_ref: String,
    pub quantity: u32,
}

impl CartLine {
    pub fn new(item_id: i64, name: impl Into<String>, unit_price: Decimal, quantity: u32) -> Self {
        Self {
            item_id,
            name: name.into(),
            unit_price,
            image_ref: String::new(),
            quantity,
        }
    }

    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    /// Wire shape used in `cartItems`.
    pub fn to_order_item(&self) -> OrderItem {
        OrderItem {
            name: self.name.clone(),
            quantity: i64::from(self.quantity),
            price: self.unit_price,
        }
    }
}

/// The user's cart. Lines are unique by `item_id` and always have a
/// quantity of at least one. Every change is written through to the
/// snapshot store before the call returns.
pub struct CartStore {
    lines: Vec<CartLine>,
    snapshot: Persisted<CartLine>,
}

impl CartStore {
    /// Builds the cart from the last saved snapshot, if any.
    pub fn load(store: Arc<dyn SnapshotStore>) -> Self {
        let snapshot = Persisted::new(CART_KEY, store);
        let mut lines = snapshot.load();
        lines.retain(|l: &CartLine| l.quantity > 0);
        Self { lines, snapshot }
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn get(&self, item_id: i64) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.item_id == item_id)
    }

    fn position(&self, item_id: i64) -> Option<usize> {
        self.lines.iter().position(|l| l.item_id == item_id)
    }

    /// Adds `line`, merging quantities when the item is already present.
    /// Stock is not checked here.
    pub fn add(&mut self, line: CartLine) {
        if line.quantity == 0 {
            return;
        }
        match self.position(line.item_id) {
            Some(i) => {
                let q = &mut self.lines[i].quantity;
                *q = q.saturating_add(line.quantity);
            }
            None => self.lines.push(line),
        }
        self.persist();
    }

    pub fn remove(&mut self, item_id: i64) {
        let before = self.lines.len();
        self.lines.retain(|l| l.item_id != item_id);
        if self.lines.len() != before {
            self.persist();
        }
    }

    /// `n > 0` sets the quantity (clamped to `u32::MAX`), anything else
    /// removes the line.
    pub fn set_quantity(&mut self, item_id: i64, n: i64) {
        let Some(i) = self.position(item_id) else {
            return;
        };
        if n <= 0 {
            self.remove(item_id);
            return;
        }
        self.lines[i].quantity = u32::try_from(n).unwrap_or(u32::MAX);
        self.persist();
    }

    pub fn increment(&mut self, item_id: i64) {
        if let Some(i) = self.position(item_id) {
            self.lines[i].quantity = self.lines[i].quantity.saturating_add(1);
            self.persist();
        }
    }

    /// Decrementing a single unit removes the line.
    pub fn decrement(&mut self, item_id: i64) {
        let Some(i) = self.position(item_id) else {
            return;
        };
        if self.lines[i].quantity > 1 {
            self.lines[i].quantity -= 1;
            self.persist();
        } else {
            self.remove(item_id);
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.persist();
    }

    pub fn total(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    pub fn total_items(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |acc, l| acc.saturating_add(l.quantity))
    }

    fn persist(&self) {
        self.snapshot.save(&self.lines);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn line(id: i64, price: i64, qty: u32) -> CartLine {
        CartLine::new(id, format!("item-{}", id), Decimal::from(price), qty)
    }

    fn expected_total(cart: &CartStore) -> Decimal {
        cart.lines()
            .iter()
            .map(|l| l.unit_price * Decimal::from(l.quantity))
            .sum()
    }

    #[test]
    fn adding_same_item_merges_quantity() {
        let mut cart = CartStore::load(Arc::new(MemoryStore::new()));
        cart.add(line(1, 250, 2));
        cart.add(line(1, 250, 3));
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.get(1).unwrap().quantity, 5);
        assert_eq!(cart.total(), Decimal::from(1250));
    }

    #[test]
    fn decrement_of_single_unit_removes_line() {
        let mut cart = CartStore::load(Arc::new(MemoryStore::new()));
        cart.add(line(1, 100, 2));
        cart.decrement(1);
        assert_eq!(cart.get(1).unwrap().quantity, 1);
        cart.decrement(1);
        assert!(cart.get(1).is_none());
        assert!(cart.is_empty());
    }

    #[test]
    fn set_quantity_non_positive_removes() {
        let mut cart = CartStore::load(Arc::new(MemoryStore::new()));
        cart.add(line(1, 100, 2));
        cart.add(line(2, 40, 1));
        cart.set_quantity(1, 7);
        assert_eq!(cart.get(1).unwrap().quantity, 7);
        cart.set_quantity(1, 0);
        cart.set_quantity(2, -3);
        assert!(cart.is_empty());
    }

    #[test]
    fn total_tracks_every_mutation() {
        let mut cart = CartStore::load(Arc::new(MemoryStore::new()));
        let ops: Vec<Box<dyn Fn(&mut CartStore)>> = vec![
            Box::new(|c| c.add(line(1, 250, 2))),
            Box::new(|c| c.add(line(2, 200, 1))),
            Box::new(|c| c.increment(2)),
            Box::new(|c| c.add(CartLine::new(3, "chai", Decimal::new(1550, 2), 4))),
            Box::new(|c| c.decrement(1)),
            Box::new(|c| c.remove(2)),
            Box::new(|c| c.set_quantity(3, 1)),
            Box::new(|c| c.decrement(3)),
            Box::new(|c| c.increment(99)),
        ];
        for op in ops {
            op(&mut cart);
            assert_eq!(cart.total(), expected_total(&cart));
            assert!(cart.lines().iter().all(|l| l.quantity >= 1));
        }
        assert_eq!(cart.total(), Decimal::from(250));
    }

    #[test]
    fn zero_quantity_add_is_ignored() {
        let mut cart = CartStore::load(Arc::new(MemoryStore::new()));
        cart.add(line(1, 100, 0));
        assert!(cart.is_empty());
    }

    #[test]
    fn huge_quantities_clamp_instead_of_dropping_or_overflowing() {
        let mut cart = CartStore::load(Arc::new(MemoryStore::new()));
        cart.add(line(1, 10, 2));
        cart.set_quantity(1, 5_000_000_000);
        assert_eq!(cart.get(1).unwrap().quantity, u32::MAX);

        cart.add(line(2, 1, u32::MAX));
        cart.add(line(2, 1, 1));
        cart.increment(2);
        assert_eq!(cart.get(2).unwrap().quantity, u32::MAX);
        assert_eq!(cart.total_items(), u32::MAX);
        assert!(cart.lines().iter().all(|l| l.quantity >= 1));
    }

    #[test]
    fn every_mutation_is_persisted_and_reloaded() {
        let store: Arc<dyn SnapshotStore> = Arc::new(MemoryStore::new());
        {
            let mut cart = CartStore::load(store.clone());
            cart.add(line(1, 250, 2));
            cart.add(line(2, 200, 1));
            cart.increment(2);
        }
        let cart = CartStore::load(store.clone());
        assert_eq!(cart.total_items(), 4);
        assert_eq!(cart.total(), Decimal::from(900));

        let mut cart = cart;
        cart.clear();
        assert!(CartStore::load(store).is_empty());
    }

    #[test]
    fn corrupt_snapshot_starts_empty() {
        let store: Arc<dyn SnapshotStore> = Arc::new(MemoryStore::new());
        store.save(CART_KEY, b"not json").unwrap();
        assert!(CartStore::load(store).is_empty());
    }
}
