//! # ProductCompare Core
//!
//! Comparison engine for a product catalog.
//! Normalizes free-text specifications into numbers, ranks each attribute
//! across the compared products, builds the aligned comparison table, and
//! exports the compared set as JSON or CSV. Also provides the persisted
//! selection, favorites, and comment stores, catalog filtering, the mock
//! session service, and layered configuration.

pub mod catalog;
pub mod config;
pub mod error;
pub mod export;
pub mod normalizer;
pub mod persistence;
pub mod ranking;
pub mod session;
pub mod store;
pub mod table;
pub mod types;

// Re-export commonly used types at the crate root.
pub use catalog::{Catalog, ProductDraft, ProductFilter};
pub use config::{CompareConfig, RulesConfig, load_config};
pub use error::{
    CatalogError, CompareError, ConfigError, ExportError, Result, SessionError, StoreError,
};
pub use export::{
    DirectorySink, ExportFormat, ExportReceipt, ExportSink, Exporter, LogNotifier, Notifier,
};
pub use normalizer::{SpecCategory, SpecNormalizer};
pub use ranking::{Directionality, RankEngine, classify_stock};
pub use session::{
    FileUserRepository, InMemoryUserRepository, SessionService, UserRepository, UserUpdate,
};
pub use store::{
    CommentStore, FavoritesStore, InMemoryStore, JsonDirStore, KeyValueStore, SelectionStore,
    SharedStore,
};
pub use table::{TableBuilder, filter_identical};
pub use types::{
    Classification, Comment, ComparisonRow, ComparisonSet, MAX_COMPARED_PRODUCTS, Product, Role,
    RowKind, UNKNOWN_VALUE, User,
};
