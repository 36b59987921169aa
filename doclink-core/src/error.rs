//! Error types and result types for document source operations.
//!
//! Use [`DocumentStoreResult<T>`] as the return type for fallible operations.
//! Only failures of the primary fetch abort a read; association failures are
//! reported as [`DocumentStoreError::AssociationFetchFailed`] and logged by the
//! read pipeline without discarding the primary results.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when reading from or writing to a document store.
#[derive(Error, Debug)]
pub enum DocumentStoreError {
    /// Serialization/deserialization error when converting between document formats (BSON, JSON).
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Error during backend initialization or connection setup.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// The store could not be reached. Fatal for the whole read.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
    /// A document with the given ID already exists in the collection.
    /// The first argument is the document ID, the second is the collection name.
    #[error("Document {0} already exists in collection {1}")]
    DocumentAlreadyExists(String, String),
    /// The schema registry has no entity with this alias.
    #[error("Entity not found: {0}")]
    EntityNotFound(String),
    /// The document or write payload has an invalid structure.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    /// A filter or update used an operator the backend cannot evaluate.
    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),
    /// An error occurred in the underlying storage backend.
    #[error("Backend error: {0}")]
    Backend(String),
    /// One association hop failed. The records of the read are kept.
    #[error("Association {association} could not be fetched: {source}")]
    AssociationFetchFailed {
        /// Name of the association being resolved.
        association: String,
        /// The store error raised during the hop.
        #[source]
        source: Box<DocumentStoreError>,
    },
}

impl DocumentStoreError {
    /// Wraps an error raised while resolving the named association.
    pub fn association(association: impl Into<String>, source: DocumentStoreError) -> Self {
        DocumentStoreError::AssociationFetchFailed {
            association: association.into(),
            source: Box::new(source),
        }
    }
}

/// A specialized `Result` type for document store operations.
pub type DocumentStoreResult<T> = Result<T, DocumentStoreError>;

impl From<BsonError> for DocumentStoreError {
    fn from(err: BsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for DocumentStoreError {
    fn from(err: SerdeJsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}
