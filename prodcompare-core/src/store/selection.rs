//! Comparison selection: which product ids are being compared.
//!
//! Holds at most `max_items` ids in insertion order. Adding an id already
//! present is a no-op; adding past capacity evicts the oldest entry.

use crate::error::StoreError;
use crate::store::{SELECTION_KEY, SharedStore, load_or_reset, save};
use crate::types::MAX_COMPARED_PRODUCTS;

pub struct SelectionStore {
    store: SharedStore,
    max_items: usize,
    items: Vec<String>,
}

impl SelectionStore {
    /// Load the persisted selection with the default capacity.
    pub fn open(store: SharedStore) -> Result<Self, StoreError> {
        Self::with_capacity(store, MAX_COMPARED_PRODUCTS)
    }

    /// Load the persisted selection, keeping at most `max_items` ids.
    pub fn with_capacity(store: SharedStore, max_items: usize) -> Result<Self, StoreError> {
        let max_items = max_items.max(1);
        let mut items: Vec<String> =
            load_or_reset(store.as_ref(), SELECTION_KEY)?.unwrap_or_default();
        let mut seen = Vec::with_capacity(items.len());
        items.retain(|id| {
            if seen.contains(id) {
                false
            } else {
                seen.push(id.clone());
                true
            }
        });
        if items.len() > max_items {
            let excess = items.len() - max_items;
            items.drain(..excess);
        }
        Ok(Self {
            store,
            max_items,
            items,
        })
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, product_id: &str) -> bool {
        self.items.iter().any(|id| id == product_id)
    }

    /// Add a product id. Returns the id evicted to make room, if any.
    pub fn add(&mut self, product_id: &str) -> Result<Option<String>, StoreError> {
        if self.contains(product_id) {
            return Ok(None);
        }
        let mut next = self.items.clone();
        let evicted = if next.len() >= self.max_items {
            Some(next.remove(0))
        } else {
            None
        };
        next.push(product_id.to_string());
        self.commit(next)?;
        if let Some(old) = &evicted {
            tracing::debug!(evicted = %old, added = product_id, "selection full, evicted oldest");
        }
        Ok(evicted)
    }

    /// Remove a product id. Returns whether it was present.
    pub fn remove(&mut self, product_id: &str) -> Result<bool, StoreError> {
        if !self.contains(product_id) {
            return Ok(false);
        }
        let next = self
            .items
            .iter()
            .filter(|id| *id != product_id)
            .cloned()
            .collect();
        self.commit(next)?;
        Ok(true)
    }

    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.commit(Vec::new())
    }

    /// Persist `next`, then make it the in-memory selection.
    fn commit(&mut self, next: Vec<String>) -> Result<(), StoreError> {
        save(self.store.as_ref(), SELECTION_KEY, &next)?;
        self.items = next;
        Ok(())
    }
}
