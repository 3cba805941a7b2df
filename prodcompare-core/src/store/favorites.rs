//! Favorite products, kept as an insertion-ordered set of ids.

use crate::error::StoreError;
use crate::store::{FAVORITES_KEY, SharedStore, load_or_reset, save};

pub struct FavoritesStore {
    store: SharedStore,
    ids: Vec<String>,
}

impl FavoritesStore {
    pub fn open(store: SharedStore) -> Result<Self, StoreError> {
        let ids: Vec<String> = load_or_reset(store.as_ref(), FAVORITES_KEY)?.unwrap_or_default();
        let mut unique: Vec<String> = Vec::with_capacity(ids.len());
        for id in ids {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }
        Ok(Self { store, ids: unique })
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn is_favorite(&self, product_id: &str) -> bool {
        self.ids.iter().any(|id| id == product_id)
    }

    /// Flip the favorite flag for `product_id`. Returns the new state.
    pub fn toggle(&mut self, product_id: &str) -> Result<bool, StoreError> {
        let now_favorite = !self.is_favorite(product_id);
        let mut next: Vec<String> = self
            .ids
            .iter()
            .filter(|id| *id != product_id)
            .cloned()
            .collect();
        if now_favorite {
            next.push(product_id.to_string());
        }
        save(self.store.as_ref(), FAVORITES_KEY, &next)?;
        self.ids = next;
        Ok(now_favorite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::ReadOnlyStore;
    use crate::store::{InMemoryStore, KeyValueStore};
    use std::sync::Arc;

    #[test]
    fn test_failed_toggle_keeps_previous_state() {
        let inner = InMemoryStore::shared();
        inner.set(FAVORITES_KEY, r#"["a"]"#).unwrap();
        let mut favs = FavoritesStore::open(Arc::new(ReadOnlyStore::new(inner))).unwrap();

        assert!(favs.toggle("a").is_err());
        assert!(favs.toggle("b").is_err());
        assert_eq!(favs.ids(), ["a"]);
    }

    #[test]
    fn test_toggle_adds_and_removes() {
        let mut favs = FavoritesStore::open(InMemoryStore::shared()).unwrap();
        assert!(favs.toggle("1").unwrap());
        assert!(favs.is_favorite("1"));
        assert!(!favs.toggle("1").unwrap());
        assert!(!favs.is_favorite("1"));
    }

    #[test]
    fn test_favorites_persist() {
        let store = InMemoryStore::shared();
        let mut favs = FavoritesStore::open(store.clone()).unwrap();
        favs.toggle("a").unwrap();
        favs.toggle("b").unwrap();

        let reopened = FavoritesStore::open(store).unwrap();
        assert_eq!(reopened.ids(), ["a", "b"]);
    }

    #[test]
    fn test_corrupt_favorites_are_empty() {
        let store = InMemoryStore::shared();
        store.set(FAVORITES_KEY, "[1, 2").unwrap();
        let favs = FavoritesStore::open(store).unwrap();
        assert!(favs.ids().is_empty());
    }
}
