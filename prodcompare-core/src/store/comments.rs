//! Product comments. New comments are prepended; reads come back newest first.

use chrono::Utc;
use uuid::Uuid;

use crate::error::StoreError;
use crate::store::{COMMENTS_KEY, SharedStore, load_or_reset, save};
use crate::types::Comment;

pub struct CommentStore {
    store: SharedStore,
    comments: Vec<Comment>,
}

impl CommentStore {
    pub fn open(store: SharedStore) -> Result<Self, StoreError> {
        let comments = load_or_reset(store.as_ref(), COMMENTS_KEY)?.unwrap_or_default();
        Ok(Self { store, comments })
    }

    /// Every comment, newest first.
    pub fn all(&self) -> &[Comment] {
        &self.comments
    }

    /// Add a comment stamped with the current time.
    pub fn add(
        &mut self,
        product_id: &str,
        author: &str,
        text: &str,
        rating: u8,
    ) -> Result<Comment, StoreError> {
        self.add_at(product_id, author, text, rating, Utc::now().timestamp_millis())
    }

    /// Add a comment with an explicit timestamp in epoch milliseconds.
    pub fn add_at(
        &mut self,
        product_id: &str,
        author: &str,
        text: &str,
        rating: u8,
        timestamp: i64,
    ) -> Result<Comment, StoreError> {
        let author = author.trim();
        let text = text.trim();
        if author.is_empty() {
            return Err(StoreError::InvalidComment {
                reason: "author is required".into(),
            });
        }
        if text.is_empty() {
            return Err(StoreError::InvalidComment {
                reason: "text is required".into(),
            });
        }
        if !(1..=5).contains(&rating) {
            return Err(StoreError::InvalidComment {
                reason: format!("rating must be within 1-5, got {rating}"),
            });
        }

        let comment = Comment {
            id: Uuid::new_v4().to_string(),
            product_id: product_id.to_string(),
            author: author.to_string(),
            text: text.to_string(),
            rating,
            timestamp,
        };
        let mut next = Vec::with_capacity(self.comments.len() + 1);
        next.push(comment.clone());
        next.extend(self.comments.iter().cloned());
        save(self.store.as_ref(), COMMENTS_KEY, &next)?;
        self.comments = next;
        Ok(comment)
    }

    /// Comments for one product, newest first.
    pub fn for_product(&self, product_id: &str) -> Vec<&Comment> {
        let mut found: Vec<&Comment> = self
            .comments
            .iter()
            .filter(|c| c.product_id == product_id)
            .collect();
        found.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        found
    }

    pub fn count_for_product(&self, product_id: &str) -> usize {
        self.comments
            .iter()
            .filter(|c| c.product_id == product_id)
            .count()
    }

    /// Delete a comment by id. Returns whether it existed.
    pub fn delete(&mut self, comment_id: &str) -> Result<bool, StoreError> {
        if !self.comments.iter().any(|c| c.id == comment_id) {
            return Ok(false);
        }
        let next: Vec<Comment> = self
            .comments
            .iter()
            .filter(|c| c.id != comment_id)
            .cloned()
            .collect();
        save(self.store.as_ref(), COMMENTS_KEY, &next)?;
        self.comments = next;
        Ok(true)
    }
}
