//! In-memory document storage backend for doclink.
//!
//! This crate provides a thread-safe, in-memory implementation of the `StoreBackend` trait.
//! It uses async-aware read-write locks for concurrent access and is ideal for development,
//! testing, and small-scale deployments.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using async-aware RwLock
//! - **Store order** - Documents are returned in insertion order unless sorted
//! - **Filter evaluation** - Equality, `$in`/`$nin`, comparisons, `$exists`, `$not` and `$and`/`$or`/`$nor`
//! - **Update operators** - `$set`, `$unset`, `$inc`, `$push`, whole-document replacement and upserts
//!
//! # Quick Start
//!
//! ```ignore
//! use doclink::{prelude::*, memory::InMemoryStore};
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = InMemoryStore::builder().build().await?;
//!     let schema = Schema::builder().entity(EntitySchema::new("User")).build();
//!     let source = DocumentSource::new(backend, schema);
//!
//!     let id = source.create("User", doc! { "name": "Alice" }).await?;
//!     let users = source.read("User", ReadQuery::builder().condition("id", id).build()).await?;
//!     assert_eq!(users.len(), 1);
//!
//!     Ok(())
//! }
//! ```

pub mod store;
pub mod evaluator;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
