use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{client::persisted::Persisted, storage::SnapshotStore};

pub const FAVORITES_KEY: &str = "favorite_items";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Snack,
    Breakfast,
    Veg,
    NonVeg,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteLine {
    pub item_id: i64,
    pub name: String,
    pub unit_price: i64,
    pub image_ref: String,
    pub category: Category,
    /// Carried over from the add-to-cart payload; not shown to the user.
    pub quantity: u32,
}

impl FavoriteLine {
    fn key(&self) -> (i64, Category) {
        (self.item_id, self.category)
    }
}

/// Wishlist keyed by `(item_id, category)`: the same dish saved from two
/// menus is two favorites.
pub struct FavoritesStore {
    lines: Vec<FavoriteLine>,
    snapshot: Persisted<FavoriteLine>,
}

impl FavoritesStore {
    pub fn load(store: Arc<dyn SnapshotStore>) -> Self {
        let snapshot = Persisted::new(FAVORITES_KEY, store);
        let lines = snapshot.load();
        Self { lines, snapshot }
    }

    fn position(&self, item_id: i64, category: Category) -> Option<usize> {
        self.lines
            .iter()
            .position(|l| l.key() == (item_id, category))
    }

    pub fn add(&mut self, line: FavoriteLine) {
        match self.position(line.item_id, line.category) {
            Some(i) => {
                let q = &mut self.lines[i].quantity;
                *q = q.saturating_add(line.quantity);
            }
            None => self.lines.push(line),
        }
        self.persist();
    }

    pub fn remove(&mut self, item_id: i64, category: Category) {
        let before = self.lines.len();
        self.lines.retain(|l| l.key() != (item_id, category));
        if self.lines.len() != before {
            self.persist();
        }
    }

    pub fn set_quantity(&mut self, item_id: i64, category: Category, n: i64) {
        let Some(i) = self.position(item_id, category) else {
            return;
        };
        if n <= 0 {
            self.remove(item_id, category);
            return;
        }
        self.lines[i].quantity = u32::try_from(n).unwrap_or(u32::MAX);
        self.persist();
    }

    pub fn increment(&mut self, item_id: i64, category: Category) {
        if let Some(i) = self.position(item_id, category) {
            self.lines[i].quantity = self.lines[i].quantity.saturating_add(1);
            self.persist();
        }
    }

    pub fn decrement(&mut self, item_id: i64, category: Category) {
        let Some(i) = self.position(item_id, category) else {
            return;
        };
        if self.lines[i].quantity > 1 {
            self.lines[i].quantity -= 1;
            self.persist();
        } else {
            self.remove(item_id, category);
        }
    }

    /// Adds the line when absent, removes it when present.
    pub fn toggle(&mut self, line: FavoriteLine) {
        if self.contains(&line) {
            self.remove(line.item_id, line.category);
        } else {
            self.add(line);
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.persist();
    }

    pub fn contains(&self, line: &FavoriteLine) -> bool {
        self.contains_item(line.item_id, line.category)
    }

    pub fn contains_item(&self, item_id: i64, category: Category) -> bool {
        self.position(item_id, category).is_some()
    }

    pub fn in_category(&self, category: Category) -> Vec<&FavoriteLine> {
        self.lines.iter().filter(|l| l.category == category).collect()
    }

    pub fn all(&self) -> &[FavoriteLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn persist(&self) {
        self.snapshot.save(&self.lines);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn fav(id: i64, category: Category) -> FavoriteLine {
        FavoriteLine {
            item_id: id,
            name: format!("dish-{}", id),
            unit_price: 120,
            image_ref: String::new(),
            category,
            quantity: 1,
        }
    }

    #[test]
    fn same_item_in_two_categories_is_two_favorites() {
        let mut favs = FavoritesStore::load(Arc::new(MemoryStore::new()));
        favs.add(fav(5, Category::Snack));
        favs.add(fav(5, Category::Breakfast));
        assert_eq!(favs.all().len(), 2);
        assert!(favs.contains_item(5, Category::Snack));
        assert!(!favs.contains_item(5, Category::Veg));
        assert_eq!(favs.in_category(Category::Breakfast).len(), 1);
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut favs = FavoritesStore::load(Arc::new(MemoryStore::new()));
        favs.toggle(fav(1, Category::NonVeg));
        assert!(favs.contains(&fav(1, Category::NonVeg)));
        favs.toggle(fav(1, Category::NonVeg));
        assert!(favs.is_empty());
    }

    #[test]
    fn decrement_and_set_quantity_remove_at_zero() {
        let mut favs = FavoritesStore::load(Arc::new(MemoryStore::new()));
        favs.add(fav(1, Category::Veg));
        favs.increment(1, Category::Veg);
        favs.decrement(1, Category::Veg);
        assert_eq!(favs.all()[0].quantity, 1);
        favs.decrement(1, Category::Veg);
        assert!(favs.is_empty());

        favs.add(fav(2, Category::Veg));
        favs.set_quantity(2, Category::Veg, 0);
        assert!(favs.is_empty());
    }

    #[test]
    fn huge_quantities_clamp_instead_of_dropping_or_overflowing() {
        let mut favs = FavoritesStore::load(Arc::new(MemoryStore::new()));
        favs.add(fav(1, Category::Snack));
        favs.set_quantity(1, Category::Snack, 5_000_000_000);
        assert_eq!(favs.all()[0].quantity, u32::MAX);
        favs.add(fav(1, Category::Snack));
        favs.increment(1, Category::Snack);
        assert_eq!(favs.all()[0].quantity, u32::MAX);
    }

    #[test]
    fn persists_independently_of_the_cart() {
        let store: Arc<dyn SnapshotStore> = Arc::new(MemoryStore::new());
        let mut favs = FavoritesStore::load(store.clone());
        favs.add(fav(3, Category::Snack));

        assert!(store.load(crate::client::cart::CART_KEY).unwrap().is_none());
        let reloaded = FavoritesStore::load(store);
        assert_eq!(reloaded.all(), favs.all());
    }

    #[test]
    fn category_uses_kebab_case_on_disk() {
        let json = serde_json::to_string(&Category::NonVeg).unwrap();
        assert_eq!(json, "\"non-veg\"");
    }
}
