//! Relational associations over a schemaless JSON document store.
//!
//! This crate is the core of the doclink project and provides:
//!
//! - **Store backend abstraction** ([`backend`]) - Traits for implementing different storage backends
//! - **Document source** ([`source`]) - Relational reads and writes with association resolution
//! - **Schema registry** ([`schema`]) - Entities, primary keys and association descriptors
//! - **Read queries** ([`query`]) - Conditions, ordering, pagination and recursion depth
//! - **Identifiers** ([`identifier`]) - Conversion between canonical and string identifiers
//! - **Conditions** ([`condition`]) - Translation of condition maps into store filters
//! - **Update bodies** ([`update`]) - Composition of partial updates
//! - **Merging** ([`merge`]) - Correlation of related record sets
//! - **Error handling** ([`error`]) - Comprehensive error types and result types
//!
//! # Example
//!
//! ```ignore
//! use doclink::prelude::*;
//! use bson::doc;
//!
//! let schema = Schema::builder()
//!     .entity(EntitySchema::new("Vehicle").association(Association::has_many("VehiclePart")))
//!     .entity(EntitySchema::new("VehiclePart").association(Association::belongs_to("Vehicle")))
//!     .build();
//!
//! let source = DocumentSource::new(backend, schema);
//! let vehicles = source.read("Vehicle", ReadQuery::builder().recursive(1).build()).await?;
//!
//! for vehicle in vehicles {
//!     println!("{:?} has parts {:?}", vehicle.fields("Vehicle"), vehicle.many("VehiclePart"));
//! }
//! ```

pub mod backend;
pub mod condition;
pub mod config;
pub mod error;
pub mod identifier;
pub mod merge;
pub mod projector;
pub mod query;
pub mod record;
pub mod resolver;
pub mod schema;
pub mod source;
pub mod update;
