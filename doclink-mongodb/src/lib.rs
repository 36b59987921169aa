//! MongoDB backend implementation for doclink.
//!
//! This crate provides a MongoDB-based implementation of the `StoreBackend` trait.
//! The filters and update bodies produced by the document source are MongoDB's own
//! query language, so they are handed to the driver as they are.
//!
//! To use this backend, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! doclink = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Features
//!
//! - **Persistent storage** - Data is persisted to MongoDB Atlas or self-hosted MongoDB
//! - **Native queries** - Filters, projections, sorting and update operators run on the server
//! - **Async/await** - Fully asynchronous API built on MongoDB's async driver
//! - **Command passthrough** - Raw database commands through `run_command`
//!
//! # Connection
//!
//! To use this backend, you need a MongoDB connection string. This can be provided
//! through the builder pattern. Server selection and I/O failures surface as
//! `DocumentStoreError::StoreUnavailable`.
//!
//! # Example
//!
//! ```ignore
//! use doclink::{backend::StoreBackendBuilder, mongodb::MongoDbStore, prelude::*};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MongoDbStore::builder("mongodb://localhost:27017", "my_database")
//!         .build()
//!         .await?;
//!     let source = DocumentSource::new(store, Schema::new());
//!
//!     Ok(())
//! }
//! ```

pub mod store;

pub use store::{MongoDbStore, MongoDbStoreBuilder};
