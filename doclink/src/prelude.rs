//! Convenient re-exports of commonly used types from doclink.
//!
//! Import this prelude module to quickly access the most frequently used types
//! and traits without needing to import from multiple sub-modules:
//!
//! ```ignore
//! use doclink::prelude::*;
//! ```
//!
//! This provides access to:
//! - The document source and its configuration
//! - Store backends and builders
//! - Schema and association descriptors
//! - Read and modify queries, and records
//! - Error types

pub use doclink_core::{
    source::DocumentSource,
    config::SourceConfig,
    backend::{
        StoreBackend, StoreBackendBuilder, FindOptions, UpdateOptions, Modification,
        FindAndModifyOptions,
    },
    schema::{Association, AssociationKind, EntitySchema, JoinCollection, Schema, SchemaRegistry},
    query::{
        ModifyQuery, ModifyQueryBuilder, ReadQuery, ReadQueryBuilder, RecursionBudget, Sort,
        SortDirection,
    },
    record::Record,
    error::{DocumentStoreError, DocumentStoreResult},
};
