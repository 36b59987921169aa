//! Shared fixtures for the integration tests.
//!
//! The fixture garage has two vehicles. V1 has two parts, two engines, a
//! manufacturer and two owners linked in the order O2, O1. V2 has nothing and
//! points at a manufacturer that does not exist. A third part has no vehicle.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bson::{Bson, Document, doc, oid::ObjectId};
use doclink::{memory::InMemoryStore, prelude::*};

pub const V1: &str = "5f1d7c2b9a1e4c3b2a1d0e01";
pub const V2: &str = "5f1d7c2b9a1e4c3b2a1d0e02";
pub const M1: &str = "5f1d7c2b9a1e4c3b2a1d0ea1";
pub const M_GONE: &str = "5f1d7c2b9a1e4c3b2a1d0eff";
pub const O1: &str = "5f1d7c2b9a1e4c3b2a1d0eb1";
pub const O2: &str = "5f1d7c2b9a1e4c3b2a1d0eb2";
pub const C1: &str = "5f1d7c2b9a1e4c3b2a1d0ec1";

pub fn oid(hex: &str) -> ObjectId {
    ObjectId::parse_str(hex).unwrap()
}

/// Backend wrapper that records every `find` and fails on one collection.
#[derive(Debug, Clone, Default)]
pub struct RecordingStore {
    inner: InMemoryStore,
    finds: Arc<Mutex<Vec<(String, Document)>>>,
    failing: Option<String>,
}

impl RecordingStore {
    pub fn new(inner: InMemoryStore) -> Self {
        Self { inner, ..Self::default() }
    }

    pub fn failing_on(mut self, collection: &str) -> Self {
        self.failing = Some(collection.to_string());
        self
    }

    pub fn finds(&self) -> Vec<(String, Document)> {
        self.finds.lock().unwrap().clone()
    }

    pub fn find_count(&self) -> usize {
        self.finds.lock().unwrap().len()
    }

    fn check(&self, collection: &str) -> DocumentStoreResult<()> {
        match &self.failing {
            Some(failing) if failing == collection => Err(DocumentStoreError::StoreUnavailable(
                format!("{collection} is offline"),
            )),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl StoreBackend for RecordingStore {
    async fn find(
        &self,
        collection: &str,
        filter: Document,
        options: FindOptions,
    ) -> DocumentStoreResult<Vec<Document>> {
        self.finds
            .lock()
            .unwrap()
            .push((collection.to_string(), filter.clone()));
        self.check(collection)?;

        self.inner.find(collection, filter, options).await
    }

    async fn count(&self, collection: &str, filter: Document) -> DocumentStoreResult<u64> {
        self.check(collection)?;
        self.inner.count(collection, filter).await
    }

    async fn insert(&self, collection: &str, document: Document) -> DocumentStoreResult<Bson> {
        self.check(collection)?;
        self.inner.insert(collection, document).await
    }

    async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> DocumentStoreResult<Vec<Bson>> {
        self.check(collection)?;
        self.inner.insert_many(collection, documents).await
    }

    async fn update(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> DocumentStoreResult<u64> {
        self.check(collection)?;
        self.inner.update(collection, filter, update, options).await
    }

    async fn remove(&self, collection: &str, filter: Document) -> DocumentStoreResult<u64> {
        self.check(collection)?;
        self.inner.remove(collection, filter).await
    }

    async fn find_and_modify(
        &self,
        collection: &str,
        filter: Document,
        modification: Modification,
        options: FindAndModifyOptions,
    ) -> DocumentStoreResult<Option<Document>> {
        self.check(collection)?;
        self.inner.find_and_modify(collection, filter, modification, options).await
    }

    async fn ensure_index(
        &self,
        collection: &str,
        keys: Document,
        unique: bool,
    ) -> DocumentStoreResult<()> {
        self.check(collection)?;
        self.inner.ensure_index(collection, keys, unique).await
    }

    async fn distinct(
        &self,
        collection: &str,
        field: &str,
        filter: Document,
    ) -> DocumentStoreResult<Vec<Bson>> {
        self.check(collection)?;
        self.inner.distinct(collection, field, filter).await
    }

    async fn run_command(&self, command: Document) -> DocumentStoreResult<Document> {
        self.inner.run_command(command).await
    }
}

pub fn schema() -> Schema {
    Schema::builder()
        .entity(
            EntitySchema::new("Vehicle")
                .collection("vehicles")
                .association(Association::has_many("VehiclePart"))
                .association(Association::has_one("Engine"))
                .association(Association::belongs_to("Manufacturer"))
                .association(Association::many_to_many("Owner", "OwnersVehicle")),
        )
        .entity(
            EntitySchema::new("VehiclePart")
                .collection("vehicle_parts")
                .association(Association::belongs_to("Vehicle")),
        )
        .entity(EntitySchema::new("Engine").collection("engines"))
        .entity(
            EntitySchema::new("Manufacturer")
                .collection("manufacturers")
                .association(Association::has_many("Vehicle")),
        )
        .entity(EntitySchema::new("Owner").collection("owners"))
        .entity(EntitySchema::new("OwnersVehicle").collection("owners_vehicles"))
        .entity(
            EntitySchema::new("Counter")
                .collection("counters")
                .no_set_operator("$inc"),
        )
        .entity(EntitySchema::new("Tag").collection("tags").primary_key("_id"))
        .build()
}

pub async fn garage() -> InMemoryStore {
    InMemoryStore::builder()
        .collection(
            "vehicles",
            vec![
                doc! { "_id": oid(V1), "name": "Corvette", "year": 2009, "manufacturer_id": M1 },
                doc! { "_id": oid(V2), "name": "Beetle", "year": 1968, "manufacturer_id": M_GONE },
            ],
        )
        .collection(
            "vehicle_parts",
            vec![
                doc! { "_id": 1, "name": "wheel", "vehicle_id": V1 },
                doc! { "_id": 2, "name": "door", "vehicle_id": V1 },
                doc! { "_id": 3, "name": "loose bolt" },
            ],
        )
        .collection(
            "engines",
            vec![
                doc! { "_id": 1, "hp": 430, "vehicle_id": V1 },
                doc! { "_id": 2, "hp": 300, "vehicle_id": V1 },
            ],
        )
        .collection("manufacturers", vec![doc! { "_id": oid(M1), "name": "Chevrolet" }])
        .collection(
            "owners",
            vec![
                doc! { "_id": oid(O1), "name": "Ann" },
                doc! { "_id": oid(O2), "name": "Bob" },
            ],
        )
        .collection(
            "owners_vehicles",
            vec![
                doc! { "_id": 1, "vehicle_id": V1, "owner_id": O2 },
                doc! { "_id": 2, "vehicle_id": V1, "owner_id": O1 },
            ],
        )
        .collection("counters", vec![doc! { "_id": oid(C1), "hits": 1 }])
        .build()
        .await
        .unwrap()
}

pub async fn source() -> DocumentSource<RecordingStore> {
    DocumentSource::new(RecordingStore::new(garage().await), schema())
}

pub async fn failing_source(collection: &str) -> DocumentSource<RecordingStore> {
    DocumentSource::new(RecordingStore::new(garage().await).failing_on(collection), schema())
}

/// The string field `field` of every document in `values`.
pub fn names(values: &[Bson], field: &str) -> Vec<String> {
    values
        .iter()
        .map(|value| value.as_document().unwrap().get_str(field).unwrap().to_string())
        .collect()
}
