//! Main doclink crate providing relational associations over document stores.
//!
//! This crate is the primary entry point for users of the doclink framework.
//! It re-exports the core types and functionality from various sub-crates and provides
//! convenient access to different storage backends.
//!
//! # Features
//!
//! - **Relational reads** - Conditions, field lists, ordering and pagination over schemaless collections
//! - **Associations** - hasMany, hasOne, belongsTo and many-to-many through a join collection
//! - **Bounded recursion** - Nested associations resolved down to a requested depth
//! - **Partial writes** - Field patches or a configured store operator, with the timestamp in `$set`
//! - **Multiple backends** - Support for in-memory and MongoDB storage with extensible trait system
//!
//! # Quick Start
//!
//! ```ignore
//! use doclink::{prelude::*, memory::InMemoryStore};
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let schema = Schema::builder()
//!         .entity(
//!             EntitySchema::new("Vehicle")
//!                 .association(Association::has_many("VehiclePart"))
//!                 .association(Association::many_to_many("Owner", "OwnersVehicle")),
//!         )
//!         .entity(EntitySchema::new("VehiclePart").association(Association::belongs_to("Vehicle")))
//!         .entity(EntitySchema::new("Owner"))
//!         .entity(EntitySchema::new("OwnersVehicle"))
//!         .build();
//!
//!     let source = DocumentSource::new(InMemoryStore::builder().build().await.unwrap(), schema);
//!
//!     // Insert a vehicle and one of its parts
//!     let vehicle_id = source.create("Vehicle", doc! { "name": "Corvette" }).await.unwrap();
//!     source
//!         .create("VehiclePart", doc! { "name": "wheel", "vehicle_id": vehicle_id.clone() })
//!         .await
//!         .unwrap();
//!
//!     // Read the vehicle with its parts and owners
//!     let vehicles = source
//!         .read(
//!             "Vehicle",
//!             ReadQuery::builder()
//!                 .condition("Vehicle.id", vehicle_id)
//!                 .recursive(1)
//!                 .build(),
//!         )
//!         .await
//!         .unwrap();
//!
//!     println!("Parts: {:?}", vehicles[0].many("VehiclePart"));
//!
//!     // Shutdown the source and its backend
//!     source.shutdown().await.unwrap();
//! }
//! ```
//!
//! # Backends
//!
//! - [`memory`] - Fast in-memory storage for development and testing
//! - [`mongodb`] - Persistent MongoDB backend (requires `mongodb` feature)

pub mod prelude;

pub use doclink_core::{
    backend, condition, config, error, identifier, merge, projector, query, record, resolver,
    schema, source, update,
};

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage backend implementations.
pub mod memory {
    pub use doclink_memory::{InMemoryStore, InMemoryStoreBuilder};
}

/// MongoDB storage backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use doclink_mongodb::{MongoDbStore, MongoDbStoreBuilder};
}
