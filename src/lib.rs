//! Customers, items and the reviews that link them.
//!
//! [`db::Database`] persists the three tables in SQLite and performs the
//! owner-side cascades. [`db::Database::load_snapshot`] reads a consistent
//! [`graph::Snapshot`], which [`serialize::Serializer`] turns into nested
//! JSON without re-expanding back-references.

pub mod config;
pub mod db;
pub mod error;
pub mod graph;
pub mod models;
pub mod schema;
pub mod serialize;

pub use config::StoreConfig;
pub use db::Database;
pub use error::{Result, StoreError};
pub use graph::Snapshot;
pub use models::{Customer, Item, NewReview, Review};
pub use serialize::{serialize, Exclusion, Record, RecordKind, Relation, Serializer};
