//! Store driver abstraction for the document source.
//!
//! This module defines the traits that abstract over the document store a
//! [`DocumentSource`](crate::source::DocumentSource) talks to. The source only ever
//! sends store-native (Mongo-style) filter and update documents through this
//! interface; it never inspects cursors or connections.
//!
//! # Traits
//!
//! - [`StoreBackend`]: The core trait for store drivers
//! - [`StoreBackendBuilder`]: Factory trait for creating backend instances
//!
//! [`FindOptions`], [`UpdateOptions`], [`Modification`] and
//! [`FindAndModifyOptions`] carry the per-call options.
//!
//! # Examples
//!
//! ```ignore
//! use doclink::backend::{StoreBackend, FindOptions};
//! use bson::doc;
//!
//! let backend = MyBackendImpl::new();
//!
//! let id = backend.insert("users", doc! { "name": "Alice", "age": 30 }).await?;
//! let found = backend
//!     .find("users", doc! { "age": { "$gte": 18 } }, FindOptions::default())
//!     .await?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use async_trait::async_trait;
use bson::{Bson, Document};
use std::fmt::Debug;

use crate::error::DocumentStoreResult;

/// Options for a [`StoreBackend::find`] call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    /// Fields to return, as `{field: 1}`. `None` returns whole documents.
    pub projection: Option<Document>,
    /// Sort keys, as `{field: 1 | -1}` in priority order.
    pub sort: Option<Document>,
    /// Number of documents to skip.
    pub skip: Option<u64>,
    /// Maximum number of documents to return.
    pub limit: Option<i64>,
}

/// Options for a [`StoreBackend::update`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Update every matching document instead of the first one.
    pub multi: bool,
    /// Insert a document when nothing matches.
    pub upsert: bool,
}

/// What a [`StoreBackend::find_and_modify`] call does to the document it finds.
#[derive(Debug, Clone, PartialEq)]
pub enum Modification {
    /// Applies an update body, inserting a document when `upsert` is set and
    /// nothing matches.
    Update { update: Document, upsert: bool },
    /// Removes the document.
    Remove,
}

/// Options for a [`StoreBackend::find_and_modify`] call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindAndModifyOptions {
    /// Fields to return, as `{field: 1}`.
    pub projection: Option<Document>,
    /// Picks the first document in this order when several match.
    pub sort: Option<Document>,
    /// Return the document as it is after an update instead of before it.
    pub return_new: bool,
}

/// Abstract interface for document store drivers.
///
/// Filters and update bodies are store-native documents such as
/// `{"age": {"$in": [1, 2]}}` or `{"$set": {"name": "x"}}`.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`. The document source issues its calls
/// sequentially, but several sources may share a backend.
///
/// # Error Handling
///
/// Connection failures should be reported as
/// [`DocumentStoreError::StoreUnavailable`](crate::error::DocumentStoreError::StoreUnavailable),
/// failed operations as [`DocumentStoreError::Backend`](crate::error::DocumentStoreError::Backend).
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Returns the documents of `collection` matching `filter`, in store order
    /// unless a sort is given.
    async fn find(
        &self,
        collection: &str,
        filter: Document,
        options: FindOptions,
    ) -> DocumentStoreResult<Vec<Document>>;

    /// Counts the documents of `collection` matching `filter`.
    async fn count(&self, collection: &str, filter: Document) -> DocumentStoreResult<u64>;

    /// Inserts a document and returns its `_id`. A missing `_id` is generated by the store.
    async fn insert(&self, collection: &str, document: Document) -> DocumentStoreResult<Bson>;

    /// Inserts `documents` in order and returns their `_id`s.
    async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> DocumentStoreResult<Vec<Bson>>;

    /// Applies `update` to the documents matching `filter` and returns the number matched.
    async fn update(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> DocumentStoreResult<u64>;

    /// Removes the documents matching `filter` and returns the number removed.
    async fn remove(&self, collection: &str, filter: Document) -> DocumentStoreResult<u64>;

    /// Atomically finds one document matching `filter` and modifies it.
    ///
    /// Returns the document before the modification, or after it when
    /// `options.return_new` is set. `None` when nothing matched and nothing was
    /// upserted.
    async fn find_and_modify(
        &self,
        collection: &str,
        filter: Document,
        modification: Modification,
        options: FindAndModifyOptions,
    ) -> DocumentStoreResult<Option<Document>>;

    /// Removes every document of `collection`.
    async fn truncate(&self, collection: &str) -> DocumentStoreResult<u64> {
        self.remove(collection, Document::new()).await
    }

    /// Creates an index over `keys` (`{field: 1 | -1}`) unless it already exists.
    async fn ensure_index(
        &self,
        collection: &str,
        keys: Document,
        unique: bool,
    ) -> DocumentStoreResult<()>;

    /// Returns the distinct values of `field` among the documents matching `filter`.
    async fn distinct(
        &self,
        collection: &str,
        field: &str,
        filter: Document,
    ) -> DocumentStoreResult<Vec<Bson>>;

    /// Runs a raw database command.
    async fn run_command(&self, command: Document) -> DocumentStoreResult<Document>;

    /// Cleanly shuts down the backend, releasing all resources.
    ///
    /// The default implementation is a no-op.
    async fn shutdown(self) -> DocumentStoreResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

#[async_trait]
impl<B> StoreBackend for &B
where
    B: StoreBackend,
{
    async fn find(
        &self,
        collection: &str,
        filter: Document,
        options: FindOptions,
    ) -> DocumentStoreResult<Vec<Document>> {
        (*self)
            .find(collection, filter, options)
            .await
    }

    async fn count(&self, collection: &str, filter: Document) -> DocumentStoreResult<u64> {
        (*self).count(collection, filter).await
    }

    async fn insert(&self, collection: &str, document: Document) -> DocumentStoreResult<Bson> {
        (*self).insert(collection, document).await
    }

    async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> DocumentStoreResult<Vec<Bson>> {
        (*self).insert_many(collection, documents).await
    }

    async fn update(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> DocumentStoreResult<u64> {
        (*self)
            .update(collection, filter, update, options)
            .await
    }

    async fn remove(&self, collection: &str, filter: Document) -> DocumentStoreResult<u64> {
        (*self).remove(collection, filter).await
    }

    async fn find_and_modify(
        &self,
        collection: &str,
        filter: Document,
        modification: Modification,
        options: FindAndModifyOptions,
    ) -> DocumentStoreResult<Option<Document>> {
        (*self)
            .find_and_modify(collection, filter, modification, options)
            .await
    }

    async fn truncate(&self, collection: &str) -> DocumentStoreResult<u64> {
        (*self).truncate(collection).await
    }

    async fn ensure_index(
        &self,
        collection: &str,
        keys: Document,
        unique: bool,
    ) -> DocumentStoreResult<()> {
        (*self).ensure_index(collection, keys, unique).await
    }

    async fn distinct(
        &self,
        collection: &str,
        field: &str,
        filter: Document,
    ) -> DocumentStoreResult<Vec<Bson>> {
        (*self)
            .distinct(collection, field, filter)
            .await
    }

    async fn run_command(&self, command: Document) -> DocumentStoreResult<Document> {
        (*self).run_command(command).await
    }
}

/// Factory for store backends.
#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    async fn build(self) -> DocumentStoreResult<Self::Backend>;
}
