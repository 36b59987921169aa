//! In-memory storage implementation for document stores.
//!
//! This module provides a simple in-memory backend that keeps every collection
//! as an insertion-ordered list of BSON documents behind an async-safe
//! read-write lock, and evaluates the store-native filters and update operators
//! emitted by the document source.

use std::{collections::HashMap, sync::Arc, cmp::Ordering};
use async_trait::async_trait;
use mea::rwlock::RwLock;
use bson::{Bson, Document, doc, oid::ObjectId};
use tracing::debug;

use doclink_core::{
    backend::{
        FindAndModifyOptions, FindOptions, Modification, StoreBackend, StoreBackendBuilder,
        UpdateOptions,
    },
    error::{DocumentStoreError, DocumentStoreResult},
};

use crate::evaluator::{DocumentEvaluator, Comparable, lookup};

type StoreMap = HashMap<String, Vec<Document>>;

const ID_FIELD: &str = "_id";


/// Thread-safe in-memory document storage backend.
///
/// This struct implements the [`StoreBackend`] trait to provide a fully functional
/// document store that operates entirely in memory using async-aware read-write locks.
/// Documents keep their insertion order, which is the order `find` returns them in
/// when no sort is requested.
///
/// # Thread Safety
///
/// `InMemoryStore` is cloneable and uses an `Arc`-wrapped internal state, allowing
/// it to be safely shared across async tasks. Multiple clones of the same instance
/// share the same underlying data.
///
/// # Performance
///
/// Queries scan all documents in a collection (no indexing). For small to medium
/// datasets (< 100k documents), this is typically acceptable. For larger datasets,
/// consider using a persistent backend like MongoDB.
///
/// # Example
///
/// ```ignore
/// use doclink_memory::InMemoryStore;
/// use doclink::backend::{FindOptions, StoreBackend};
/// use bson::doc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = InMemoryStore::new();
///
///     store.insert("users", doc! { "name": "Alice", "age": 30 }).await?;
///
///     let adults = store
///         .find("users", doc! { "age": { "$gte": 18 } }, FindOptions::default())
///         .await?;
///     assert_eq!(adults.len(), 1);
///
///     Ok(())
/// }
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    /// The main storage map: collection_name -> documents in insertion order
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
        }
    }

    /// Creates a builder for constructing an `InMemoryStore`, optionally seeded
    /// with documents.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use doclink_memory::InMemoryStore;
    ///
    /// let store = InMemoryStore::builder()
    ///     .collection("vehicles", vec![doc! { "name": "Beetle" }])
    ///     .build()
    ///     .await?;
    /// ```
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }
}


#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn find(
        &self,
        collection: &str,
        filter: Document,
        options: FindOptions,
    ) -> DocumentStoreResult<Vec<Document>> {
        let store = self.store.read().await;
        let documents = match store.get(collection) {
            Some(documents) => documents,
            None => return Ok(vec![]),
        };

        let mut matched = DocumentEvaluator::filter_documents(documents, &filter)?;

        if let Some(sort) = &options.sort {
            matched.sort_by(|a, b| compare_documents(a, b, sort));
        }

        let limit = options
            .limit
            .filter(|limit| *limit > 0)
            .map_or(usize::MAX, |limit| limit as usize);

        Ok(
            matched
                .into_iter()
                .skip(options.skip.map_or(0, |skip| usize::try_from(skip).unwrap_or(usize::MAX)))
                .take(limit)
                .map(|document| match &options.projection {
                    Some(projection) => project(document, projection),
                    None => document,
                })
                .collect()
        )
    }

    async fn count(&self, collection: &str, filter: Document) -> DocumentStoreResult<u64> {
        let store = self.store.read().await;
        let Some(documents) = store.get(collection) else {
            return Ok(0);
        };

        let mut count = 0;
        for document in documents {
            if DocumentEvaluator::new(document).matches(&filter)? {
                count += 1;
            }
        }

        Ok(count)
    }

    async fn insert(&self, collection: &str, document: Document) -> DocumentStoreResult<Bson> {
        let mut store = self.store.write().await;
        let documents = store
            .entry(collection.to_string())
            .or_default();

        insert_document(documents, collection, document)
    }

    async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> DocumentStoreResult<Vec<Bson>> {
        let mut store = self.store.write().await;
        let stored = store
            .entry(collection.to_string())
            .or_default();

        documents
            .into_iter()
            .map(|document| insert_document(stored, collection, document))
            .collect()
    }

    async fn update(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> DocumentStoreResult<u64> {
        let mut store = self.store.write().await;
        let documents = store
            .entry(collection.to_string())
            .or_default();

        let mut matched = 0;
        for document in documents.iter_mut() {
            if !DocumentEvaluator::new(document).matches(&filter)? {
                continue;
            }

            apply_update(document, &update)?;
            matched += 1;

            if !options.multi {
                break;
            }
        }

        if matched == 0 && options.upsert {
            let mut document = upsert_base(&filter);
            apply_update(&mut document, &update)?;
            if !document.contains_key(ID_FIELD) {
                document.insert(ID_FIELD, ObjectId::new());
            }

            debug!(collection, "upserted document");

            documents.push(document);
            matched = 1;
        }

        Ok(matched)
    }

    async fn remove(&self, collection: &str, filter: Document) -> DocumentStoreResult<u64> {
        let mut store = self.store.write().await;
        let Some(documents) = store.get_mut(collection) else {
            return Ok(0);
        };

        let mut keep = Vec::with_capacity(documents.len());
        for document in documents.iter() {
            keep.push(!DocumentEvaluator::new(document).matches(&filter)?);
        }

        let before = documents.len();
        let mut flags = keep.into_iter();
        documents.retain(|_| flags.next().unwrap_or(true));

        Ok((before - documents.len()) as u64)
    }

    async fn find_and_modify(
        &self,
        collection: &str,
        filter: Document,
        modification: Modification,
        options: FindAndModifyOptions,
    ) -> DocumentStoreResult<Option<Document>> {
        let mut store = self.store.write().await;
        let documents = store
            .entry(collection.to_string())
            .or_default();

        let mut candidates = Vec::new();
        for (position, document) in documents.iter().enumerate() {
            if DocumentEvaluator::new(document).matches(&filter)? {
                candidates.push(position);
            }
        }
        if let Some(sort) = &options.sort {
            candidates.sort_by(|a, b| compare_documents(&documents[*a], &documents[*b], sort));
        }

        let found = match (candidates.first().copied(), modification) {
            (Some(position), Modification::Remove) => Some(documents.remove(position)),
            (None, Modification::Remove) => None,
            (Some(position), Modification::Update { update, .. }) => {
                let before = documents[position].clone();
                apply_update(&mut documents[position], &update)?;

                Some(if options.return_new { documents[position].clone() } else { before })
            }
            (None, Modification::Update { update, upsert: true }) => {
                let mut document = upsert_base(&filter);
                apply_update(&mut document, &update)?;
                if !document.contains_key(ID_FIELD) {
                    document.insert(ID_FIELD, ObjectId::new());
                }

                debug!(collection, "upserted document");

                documents.push(document.clone());
                options.return_new.then_some(document)
            }
            (None, Modification::Update { upsert: false, .. }) => None,
        };

        Ok(found.map(|document| match &options.projection {
            Some(projection) => project(document, projection),
            None => document,
        }))
    }

    async fn ensure_index(
        &self,
        collection: &str,
        keys: Document,
        unique: bool,
    ) -> DocumentStoreResult<()> {
        // No indexes in memory, every query scans.
        debug!(collection, %keys, unique, "index not created in memory");

        Ok(())
    }

    async fn distinct(
        &self,
        collection: &str,
        field: &str,
        filter: Document,
    ) -> DocumentStoreResult<Vec<Bson>> {
        let store = self.store.read().await;
        let Some(documents) = store.get(collection) else {
            return Ok(vec![]);
        };

        let mut values: Vec<Bson> = Vec::new();
        for document in documents {
            if !DocumentEvaluator::new(document).matches(&filter)? {
                continue;
            }

            let found = match lookup(document, field) {
                Some(Bson::Array(items)) => items.clone(),
                Some(value) => vec![value.clone()],
                None => continue,
            };

            for value in found {
                if !values.contains(&value) {
                    values.push(value);
                }
            }
        }

        Ok(values)
    }

    async fn run_command(&self, command: Document) -> DocumentStoreResult<Document> {
        match command.keys().next().map(String::as_str) {
            Some("ping") => Ok(doc! { "ok": 1 }),
            Some(name) => Err(DocumentStoreError::UnsupportedOperator(format!("command {name}"))),
            None => Err(DocumentStoreError::InvalidDocument("empty command".to_string())),
        }
    }
}


/// Appends `document`, generating an `_id` when it has none.
fn insert_document(
    documents: &mut Vec<Document>,
    collection: &str,
    mut document: Document,
) -> DocumentStoreResult<Bson> {
    let id = match document.get(ID_FIELD).filter(|id| !matches!(id, Bson::Null)).cloned() {
        Some(id) => id,
        None => {
            let id = Bson::ObjectId(ObjectId::new());
            document.insert(ID_FIELD, id.clone());
            id
        }
    };

    if documents.iter().any(|existing| existing.get(ID_FIELD) == Some(&id)) {
        return Err(DocumentStoreError::DocumentAlreadyExists(
            display_id(&id),
            collection.to_string(),
        ));
    }

    documents.push(document);

    Ok(id)
}

fn display_id(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(value) => value.clone(),
        other => other.to_string(),
    }
}

fn compare_documents(a: &Document, b: &Document, sort: &Document) -> Ordering {
    for (field, direction) in sort {
        let left = lookup(a, field).map(Comparable::from).unwrap_or(Comparable::Null);
        let right = lookup(b, field).map(Comparable::from).unwrap_or(Comparable::Null);

        let ordering = match direction.as_i64().or_else(|| direction.as_i32().map(i64::from)) {
            Some(direction) if direction < 0 => right.sort_cmp(&left),
            _ => left.sort_cmp(&right),
        };

        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    Ordering::Equal
}

/// Keeps the projected top-level fields. `_id` is kept unless excluded.
fn project(document: Document, projection: &Document) -> Document {
    let include_id = !matches!(
        projection.get(ID_FIELD),
        Some(Bson::Int32(0) | Bson::Int64(0) | Bson::Boolean(false))
    );

    document
        .into_iter()
        .filter(|(key, _)| {
            if key == ID_FIELD {
                include_id
            } else {
                projection.contains_key(key)
            }
        })
        .collect()
}

/// Equality fields of an upsert filter seed the inserted document.
fn upsert_base(filter: &Document) -> Document {
    filter
        .iter()
        .filter(|(key, value)| {
            !key.starts_with('$')
                && !matches!(value, Bson::Document(inner) if inner.keys().any(|k| k.starts_with('$')))
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn apply_update(document: &mut Document, update: &Document) -> DocumentStoreResult<()> {
    let operators = update.keys().filter(|key| key.starts_with('$')).count();

    if operators == 0 {
        let id = document.remove(ID_FIELD);
        *document = update.clone();
        if let Some(id) = id {
            document.insert(ID_FIELD, id);
        }

        return Ok(());
    }

    if operators != update.len() {
        return Err(DocumentStoreError::InvalidDocument(
            "update mixes operators and plain fields".to_string(),
        ));
    }

    for (operator, fields) in update {
        let fields = fields.as_document().ok_or_else(|| {
            DocumentStoreError::InvalidDocument(format!("{operator} expects a document"))
        })?;

        for (field, value) in fields {
            match operator.as_str() {
                "$set" => set_path(document, field, value.clone())?,
                "$unset" => {
                    remove_path(document, field);
                }
                "$inc" => {
                    let current = lookup(document, field).cloned();
                    set_path(document, field, increment(current, value, field)?)?;
                }
                "$push" => {
                    let mut items = match lookup(document, field) {
                        None => Vec::new(),
                        Some(Bson::Array(items)) => items.clone(),
                        Some(_) => {
                            return Err(DocumentStoreError::InvalidDocument(format!(
                                "$push target {field} is not an array"
                            )));
                        }
                    };
                    items.push(value.clone());
                    set_path(document, field, Bson::Array(items))?;
                }
                _ => return Err(DocumentStoreError::UnsupportedOperator(operator.clone())),
            }
        }
    }

    Ok(())
}

fn increment(current: Option<Bson>, by: &Bson, field: &str) -> DocumentStoreResult<Bson> {
    let invalid = || DocumentStoreError::InvalidDocument(format!("$inc on non-numeric field {field}"));

    Ok(match (current, by) {
        (None | Some(Bson::Null), by) if is_number(by) => by.clone(),
        (Some(Bson::Int32(a)), Bson::Int32(b)) => Bson::Int32(a.wrapping_add(*b)),
        (Some(Bson::Int32(a)), Bson::Int64(b)) => Bson::Int64(i64::from(a) + b),
        (Some(Bson::Int64(a)), Bson::Int32(b)) => Bson::Int64(a + i64::from(*b)),
        (Some(Bson::Int64(a)), Bson::Int64(b)) => Bson::Int64(a + b),
        (Some(current), by) => match (as_f64(&current), as_f64(by)) {
            (Some(a), Some(b)) => Bson::Double(a + b),
            _ => return Err(invalid()),
        },
        _ => return Err(invalid()),
    })
}

fn is_number(value: &Bson) -> bool {
    as_f64(value).is_some()
}

fn as_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(value) => Some(f64::from(*value)),
        Bson::Int64(value) => Some(*value as f64),
        Bson::Double(value) => Some(*value),
        _ => None,
    }
}

fn set_path(document: &mut Document, path: &str, value: Bson) -> DocumentStoreResult<()> {
    match path.split_once('.') {
        None => {
            document.insert(path, value);
            Ok(())
        }
        Some((head, rest)) => {
            if !document.contains_key(head) {
                document.insert(head, Document::new());
            }

            match document.get_mut(head) {
                Some(Bson::Document(child)) => set_path(child, rest, value),
                _ => Err(DocumentStoreError::InvalidDocument(format!(
                    "cannot set {path} on a non-document field"
                ))),
            }
        }
    }
}

fn remove_path(document: &mut Document, path: &str) -> Option<Bson> {
    match path.split_once('.') {
        None => document.remove(path),
        Some((head, rest)) => match document.get_mut(head) {
            Some(Bson::Document(child)) => remove_path(child, rest),
            _ => None,
        },
    }
}


/// Builder for constructing [`InMemoryStore`] instances.
///
/// Collections added with [`collection`](Self::collection) are inserted when the
/// store is built, in the given order.
///
/// # Example
///
/// ```ignore
/// use doclink_memory::InMemoryStore;
/// use doclink::backend::StoreBackendBuilder;
///
/// #[tokio::main]
/// async fn main() {
///     let store = InMemoryStore::builder().build().await.unwrap();
/// }
/// ```
#[derive(Default)]
pub struct InMemoryStoreBuilder {
    seed: Vec<(String, Vec<Document>)>,
}

impl InMemoryStoreBuilder {
    /// Seeds `name` with `documents`. Documents without `_id` get a generated one.
    pub fn collection(mut self, name: impl Into<String>, documents: Vec<Document>) -> Self {
        self.seed.push((name.into(), documents));
        self
    }
}

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    /// Builds and returns a new [`InMemoryStore`] instance holding the seeded documents.
    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        let store = InMemoryStore::new();

        for (collection, documents) in self.seed {
            for document in documents {
                store.insert(&collection, document).await?;
            }
        }

        Ok(store)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> InMemoryStore {
        InMemoryStore::builder()
            .collection(
                "parts",
                vec![
                    doc! { "_id": 1, "name": "wheel", "count": 4, "vehicle_id": "a" },
                    doc! { "_id": 2, "name": "door", "count": 2, "vehicle_id": "a" },
                    doc! { "_id": 3, "name": "seat", "count": 5, "vehicle_id": "b" },
                ],
            )
            .build()
            .await
            .unwrap()
    }

    fn ids(documents: &[Document]) -> Vec<i32> {
        documents
            .iter()
            .map(|document| document.get_i32("_id").unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_find_keeps_insertion_order() {
        let store = seeded().await;
        let found = store
            .find("parts", doc! { "vehicle_id": { "$in": ["a", "b"] } }, FindOptions::default())
            .await
            .unwrap();

        assert_eq!(ids(&found), vec![1, 2, 3]);
        assert!(store.find("missing", doc! {}, FindOptions::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_sorts_skips_limits_and_projects() {
        let store = seeded().await;
        let options = FindOptions {
            projection: Some(doc! { "name": 1 }),
            sort: Some(doc! { "count": -1 }),
            skip: Some(1),
            limit: Some(1),
        };

        let found = store.find("parts", doc! {}, options).await.unwrap();

        assert_eq!(found, vec![doc! { "_id": 1, "name": "wheel" }]);
    }

    #[tokio::test]
    async fn test_insert_generates_identifiers_and_rejects_duplicates() {
        let store = InMemoryStore::new();

        let id = store.insert("vehicles", doc! { "name": "Beetle" }).await.unwrap();
        assert!(matches!(id, Bson::ObjectId(_)));

        let duplicate = store.insert("vehicles", doc! { "_id": id.clone() }).await;
        assert!(matches!(duplicate, Err(DocumentStoreError::DocumentAlreadyExists(_, c)) if c == "vehicles"));
        assert_eq!(store.count("vehicles", doc! {}).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_insert_many_keeps_order_and_stops_at_duplicates() {
        let store = seeded().await;

        let ids = store
            .insert_many("parts", vec![doc! { "_id": 4, "name": "mirror" }, doc! { "name": "hood" }])
            .await
            .unwrap();
        assert_eq!(ids[0], Bson::Int32(4));
        assert!(matches!(ids[1], Bson::ObjectId(_)));

        let duplicate = store
            .insert_many("parts", vec![doc! { "_id": 5 }, doc! { "_id": 1 }, doc! { "_id": 6 }])
            .await;
        assert!(matches!(duplicate, Err(DocumentStoreError::DocumentAlreadyExists(id, _)) if id == "1"));
        assert_eq!(store.count("parts", doc! {}).await.unwrap(), 6);
    }

    #[tokio::test]
    async fn test_find_and_modify_updates_first_in_sort_order() {
        let store = seeded().await;
        let bump = || Modification::Update { update: doc! { "$inc": { "count": 10 } }, upsert: false };

        let before = store
            .find_and_modify(
                "parts",
                doc! { "vehicle_id": "a" },
                bump(),
                FindAndModifyOptions { sort: Some(doc! { "count": 1 }), ..FindAndModifyOptions::default() },
            )
            .await
            .unwrap();
        assert_eq!(before, Some(doc! { "_id": 2, "name": "door", "count": 2, "vehicle_id": "a" }));

        let after = store
            .find_and_modify(
                "parts",
                doc! { "_id": 3 },
                bump(),
                FindAndModifyOptions {
                    projection: Some(doc! { "count": 1 }),
                    return_new: true,
                    ..FindAndModifyOptions::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(after, Some(doc! { "_id": 3, "count": 15 }));
        assert_eq!(store.count("parts", doc! { "count": { "$gt": 10 } }).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_find_and_modify_removes_and_upserts() {
        let store = seeded().await;

        let removed = store
            .find_and_modify("parts", doc! { "vehicle_id": "b" }, Modification::Remove, FindAndModifyOptions::default())
            .await
            .unwrap();
        assert_eq!(removed.map(|document| document.get_i32("_id").unwrap()), Some(3));
        assert_eq!(store.count("parts", doc! {}).await.unwrap(), 2);

        let missing = store
            .find_and_modify("parts", doc! { "_id": 9 }, Modification::Remove, FindAndModifyOptions::default())
            .await
            .unwrap();
        assert_eq!(missing, None);

        let upserted = store
            .find_and_modify(
                "parts",
                doc! { "name": "mirror" },
                Modification::Update { update: doc! { "$set": { "count": 1 } }, upsert: true },
                FindAndModifyOptions { return_new: true, ..FindAndModifyOptions::default() },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(upserted.get_str("name").unwrap(), "mirror");
        assert_eq!(upserted.get_i32("count").unwrap(), 1);
        assert!(upserted.get_object_id("_id").is_ok());
    }

    #[tokio::test]
    async fn test_truncate_and_index() {
        let store = seeded().await;

        store.ensure_index("parts", doc! { "vehicle_id": 1 }, false).await.unwrap();

        assert_eq!(store.truncate("parts").await.unwrap(), 3);
        assert_eq!(store.count("parts", doc! {}).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_operators() {
        let store = seeded().await;

        let matched = store
            .update(
                "parts",
                doc! { "_id": 1 },
                doc! { "$inc": { "count": 1 }, "$set": { "trim.size": "L" }, "$unset": { "vehicle_id": "" } },
                UpdateOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(matched, 1);

        let wheel = store.find("parts", doc! { "_id": 1 }, FindOptions::default()).await.unwrap();
        assert_eq!(wheel, vec![doc! { "_id": 1, "name": "wheel", "count": 5, "trim": { "size": "L" } }]);
    }

    #[tokio::test]
    async fn test_update_single_multi_and_upsert() {
        let store = seeded().await;

        let single = store
            .update("parts", doc! { "vehicle_id": "a" }, doc! { "$set": { "checked": true } }, UpdateOptions::default())
            .await
            .unwrap();
        assert_eq!(single, 1);
        assert_eq!(store.count("parts", doc! { "checked": true }).await.unwrap(), 1);

        let multi = store
            .update(
                "parts",
                doc! { "vehicle_id": "a" },
                doc! { "$set": { "checked": true } },
                UpdateOptions { multi: true, upsert: false },
            )
            .await
            .unwrap();
        assert_eq!(multi, 2);

        let upserted = store
            .update(
                "parts",
                doc! { "name": "mirror" },
                doc! { "$set": { "count": 2 } },
                UpdateOptions { multi: false, upsert: true },
            )
            .await
            .unwrap();
        assert_eq!(upserted, 1);
        assert_eq!(store.count("parts", doc! { "name": "mirror", "count": 2 }).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_replacement_keeps_identifier() {
        let store = seeded().await;

        store
            .update("parts", doc! { "_id": 3 }, doc! { "name": "bench" }, UpdateOptions::default())
            .await
            .unwrap();

        let found = store.find("parts", doc! { "_id": 3 }, FindOptions::default()).await.unwrap();
        assert_eq!(found, vec![doc! { "name": "bench", "_id": 3 }]);
    }

    #[tokio::test]
    async fn test_remove_and_distinct() {
        let store = seeded().await;

        assert_eq!(
            store.distinct("parts", "vehicle_id", doc! {}).await.unwrap(),
            vec![Bson::from("a"), Bson::from("b")],
        );

        assert_eq!(store.remove("parts", doc! { "vehicle_id": "a" }).await.unwrap(), 2);
        assert_eq!(ids(&store.find("parts", doc! {}, FindOptions::default()).await.unwrap()), vec![3]);
    }

    #[tokio::test]
    async fn test_commands() {
        let store = InMemoryStore::new();

        assert_eq!(store.run_command(doc! { "ping": 1 }).await.unwrap(), doc! { "ok": 1 });
        assert!(matches!(
            store.run_command(doc! { "dropDatabase": 1 }).await,
            Err(DocumentStoreError::UnsupportedOperator(_))
        ));
    }

    #[tokio::test]
    async fn test_unsupported_operators_surface() {
        let store = seeded().await;

        let result = store
            .update("parts", doc! { "_id": 1 }, doc! { "$rename": { "name": "title" } }, UpdateOptions::default())
            .await;

        assert!(matches!(result, Err(DocumentStoreError::UnsupportedOperator(op)) if op == "$rename"));
    }
}
