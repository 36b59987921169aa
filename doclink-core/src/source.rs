//! The document source: relational reads and writes over a [`StoreBackend`].
//!
//! A [`DocumentSource`] turns relational requests into store-native filters and
//! update bodies, projects the raw documents into alias-qualified [`Record`]s,
//! and resolves the associations declared in the [`SchemaRegistry`] down to the
//! requested recursion depth.
//!
//! # Example
//!
//! ```ignore
//! use doclink::prelude::*;
//! use bson::doc;
//!
//! let source = DocumentSource::new(backend, schema);
//!
//! let id = source.create("Vehicle", doc! { "name": "Corvette" }).await?;
//! let vehicles = source
//!     .read("Vehicle", ReadQuery::builder().condition("Vehicle.id", id).recursive(1).build())
//!     .await?;
//! ```

use bson::{Bson, Document, doc};
use futures::future::{BoxFuture, FutureExt};
use tracing::{debug, warn};

use crate::{
    backend::{FindAndModifyOptions, FindOptions, Modification, StoreBackend, UpdateOptions},
    condition::{strip_alias, strip_alias_values, translate},
    config::SourceConfig,
    error::{DocumentStoreError, DocumentStoreResult},
    identifier::{IN_OPERATOR, normalize, to_external},
    projector::{ID_FIELD, project},
    query::{ModifyQuery, ReadQuery, RecursionBudget, Sort},
    record::Record,
    schema::{EntitySchema, Schema, SchemaRegistry},
    update::compose,
};

/// Relational access to a document store.
///
/// # Type Parameters
///
/// * `B` - The backend implementation type
/// * `S` - The schema registry, [`Schema`] unless the application brings its own
#[derive(Debug)]
pub struct DocumentSource<B: StoreBackend, S: SchemaRegistry = Schema> {
    backend: B,
    schema: S,
    config: SourceConfig,
}

impl<B: StoreBackend, S: SchemaRegistry> DocumentSource<B, S> {
    /// Creates a source with the default [`SourceConfig`].
    pub fn new(backend: B, schema: S) -> Self {
        Self::with_config(backend, schema, SourceConfig::default())
    }

    pub fn with_config(backend: B, schema: S, config: SourceConfig) -> Self {
        Self { backend, schema, config }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn schema(&self) -> &S {
        &self.schema
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// Reads the records of `entity` matching `query`, with their associations.
    ///
    /// A failure of the primary fetch is returned. A failure while resolving an
    /// association is logged and leaves that association unmerged.
    pub async fn read(&self, entity: &str, query: ReadQuery) -> DocumentStoreResult<Vec<Record>> {
        self.read_records(entity, query).await
    }

    pub(crate) fn read_records<'a>(
        &'a self,
        entity: &'a str,
        query: ReadQuery,
    ) -> BoxFuture<'a, DocumentStoreResult<Vec<Record>>> {
        async move {
            let schema = self.entity(entity)?;
            let collection = schema.collection_name();
            let filter = self.filter(schema, &query.conditions);
            let options = FindOptions {
                projection: projection(schema, &query.fields),
                sort: sort_document(schema, &query.order),
                skip: query.skip(),
                limit: query.limit.filter(|limit| *limit > 0),
            };

            debug!(entity, collection, %filter, "find");

            let mut records = self
                .backend
                .find(collection, filter, options)
                .await?
                .into_iter()
                .map(|raw| {
                    project(
                        raw,
                        schema.primary_key_field(),
                        schema.alias(),
                        self.config.set_string_id,
                    )
                })
                .collect::<Vec<_>>();

            let budget = self.budget(schema, query.recursive);
            self.resolve_associations(schema, &mut records, budget)
                .await;

            Ok(records)
        }
        .boxed()
    }

    /// Resolves every association of `schema` into `records`, logging the ones
    /// that fail.
    async fn resolve_associations(
        &self,
        schema: &EntitySchema,
        records: &mut [Record],
        budget: RecursionBudget,
    ) {
        if budget.is_exhausted() || records.is_empty() {
            return;
        }

        let entity = schema.alias();
        for association in schema.associations() {
            if let Err(err) = self
                .resolve(entity, association, records, budget)
                .await
            {
                warn!(entity, association = %association.name, error = %err, "association left unmerged");
            }
        }
    }

    /// Counts the documents of `entity` matching `conditions`.
    pub async fn count(&self, entity: &str, conditions: Document) -> DocumentStoreResult<u64> {
        let schema = self.entity(entity)?;
        let filter = self.filter(schema, &conditions);

        debug!(entity, collection = schema.collection_name(), %filter, "count");

        self.backend
            .count(schema.collection_name(), filter)
            .await
    }

    /// Builds the update body `data` is written with.
    ///
    /// The primary key is never part of the body. The payload is wrapped in
    /// `$set` unless the entity is configured with another operator.
    pub fn write(&self, entity: &str, data: Document) -> DocumentStoreResult<Document> {
        let schema = self.entity(entity)?;
        let (_, body) = split_primary_key(schema, data);

        Ok(compose(body, schema.update_operator()))
    }

    /// Inserts `data` as a new document and returns its identifier.
    pub async fn create(&self, entity: &str, data: Document) -> DocumentStoreResult<Bson> {
        let schema = self.entity(entity)?;
        let document = insertable(schema, data);

        debug!(entity, collection = schema.collection_name(), "insert");

        let id = self
            .backend
            .insert(schema.collection_name(), document)
            .await?;

        Ok(self.external(id))
    }

    /// Inserts every row of `rows` in one batch and returns their identifiers in order.
    pub async fn create_many(&self, entity: &str, rows: Vec<Document>) -> DocumentStoreResult<Vec<Bson>> {
        let schema = self.entity(entity)?;
        let documents = rows
            .into_iter()
            .map(|data| insertable(schema, data))
            .collect::<Vec<_>>();

        debug!(entity, collection = schema.collection_name(), rows = documents.len(), "insert many");

        let ids = self
            .backend
            .insert_many(schema.collection_name(), documents)
            .await?;

        Ok(ids
            .into_iter()
            .map(|id| self.external(id))
            .collect())
    }

    /// Updates the single document identified by the primary key in `data`.
    pub async fn update(&self, entity: &str, data: Document) -> DocumentStoreResult<u64> {
        let schema = self.entity(entity)?;
        let (id, body) = split_primary_key(schema, data);
        let id = id.ok_or_else(|| {
            DocumentStoreError::InvalidDocument(format!(
                "update of {entity} requires a value for {}",
                schema.primary_key_field(),
            ))
        })?;

        let filter = doc! { ID_FIELD: normalize(&id, false) };
        let update = compose(body, schema.update_operator());

        debug!(entity, collection = schema.collection_name(), %filter, %update, "update");

        self.backend
            .update(schema.collection_name(), filter, update, UpdateOptions::default())
            .await
    }

    /// Applies `fields` to every document of `entity` matching `conditions`.
    pub async fn update_all(
        &self,
        entity: &str,
        fields: Document,
        conditions: Document,
    ) -> DocumentStoreResult<u64> {
        let schema = self.entity(entity)?;
        let filter = self.filter(schema, &conditions);
        let (_, body) = split_primary_key(schema, fields);
        let update = compose(body, schema.update_operator());

        debug!(entity, collection = schema.collection_name(), %filter, %update, "update all");

        self.backend
            .update(
                schema.collection_name(),
                filter,
                update,
                UpdateOptions { multi: true, upsert: false },
            )
            .await
    }

    /// Removes the documents of `entity` matching `conditions`.
    pub async fn delete(&self, entity: &str, conditions: Document) -> DocumentStoreResult<u64> {
        let schema = self.entity(entity)?;
        let filter = self.filter(schema, &conditions);

        debug!(entity, collection = schema.collection_name(), %filter, "remove");

        self.backend
            .remove(schema.collection_name(), filter)
            .await
    }

    /// Updates or removes the first record matching `query` and returns it,
    /// projected and resolved like a [`read`](Self::read).
    ///
    /// Returns `Ok(None)` when nothing matched and nothing was upserted.
    pub async fn modify(&self, entity: &str, query: ModifyQuery) -> DocumentStoreResult<Option<Record>> {
        let schema = self.entity(entity)?;
        let filter = self.filter(schema, &query.conditions);
        let modification = match (query.remove, query.update) {
            (true, _) => Modification::Remove,
            (false, Some(data)) => {
                let (_, body) = split_primary_key(schema, data);

                Modification::Update {
                    update: compose(body, schema.update_operator()),
                    upsert: query.upsert,
                }
            }
            (false, None) => {
                return Err(DocumentStoreError::InvalidDocument(format!(
                    "modify of {entity} needs an update or a removal"
                )));
            }
        };
        let options = FindAndModifyOptions {
            projection: projection(schema, &query.fields),
            sort: sort_document(schema, &query.order),
            return_new: query.return_new,
        };

        debug!(entity, collection = schema.collection_name(), %filter, ?modification, "find and modify");

        let Some(raw) = self
            .backend
            .find_and_modify(schema.collection_name(), filter, modification, options)
            .await?
        else {
            return Ok(None);
        };

        let mut records = vec![project(
            raw,
            schema.primary_key_field(),
            schema.alias(),
            self.config.set_string_id,
        )];
        let budget = self.budget(schema, query.recursive);
        self.resolve_associations(schema, &mut records, budget)
            .await;

        Ok(records.pop())
    }

    /// Removes every document of `entity`.
    pub async fn truncate(&self, entity: &str) -> DocumentStoreResult<u64> {
        let schema = self.entity(entity)?;

        debug!(entity, collection = schema.collection_name(), "truncate");

        self.backend
            .truncate(schema.collection_name())
            .await
    }

    /// Creates an index of `entity` over `keys`, given as `{field: 1 | -1}`.
    pub async fn ensure_index(&self, entity: &str, keys: Document, unique: bool) -> DocumentStoreResult<()> {
        let schema = self.entity(entity)?;
        let keys = keys
            .iter()
            .map(|(field, direction)| (store_field(schema, field), direction.clone()))
            .collect::<Document>();

        debug!(entity, collection = schema.collection_name(), %keys, unique, "ensure index");

        self.backend
            .ensure_index(schema.collection_name(), keys, unique)
            .await
    }

    /// Returns the distinct values of `field` among the documents matching `conditions`.
    pub async fn distinct(
        &self,
        entity: &str,
        field: &str,
        conditions: Document,
    ) -> DocumentStoreResult<Vec<Bson>> {
        let schema = self.entity(entity)?;
        let filter = self.filter(schema, &conditions);
        let field = store_field(schema, field);

        debug!(entity, collection = schema.collection_name(), field = field.as_str(), %filter, "distinct");

        let values = self
            .backend
            .distinct(schema.collection_name(), &field, filter)
            .await?;

        Ok(values
            .into_iter()
            .map(|value| self.external(value))
            .collect())
    }

    /// Runs a raw store command.
    pub async fn command(&self, command: Document) -> DocumentStoreResult<Document> {
        debug!(%command, "run command");

        self.backend.run_command(command).await
    }

    /// Shuts down the backend.
    pub async fn shutdown(self) -> DocumentStoreResult<()> {
        self.backend.shutdown().await
    }

    pub(crate) fn entity(&self, alias: &str) -> DocumentStoreResult<&EntitySchema> {
        self.schema
            .entity(alias)
            .ok_or_else(|| DocumentStoreError::EntityNotFound(alias.to_string()))
    }

    /// Turns relational conditions into the store filter of `schema`.
    fn filter(&self, schema: &EntitySchema, conditions: &Document) -> Document {
        let mut conditions = strip_alias(conditions, schema.alias());

        let primary_key = schema.primary_key_field();
        if primary_key != ID_FIELD {
            if let Some(value) = conditions.remove(primary_key) {
                conditions.insert(ID_FIELD, value);
            }
        }

        let mut filter = translate(&conditions);
        if let Some(id) = filter.get(ID_FIELD) {
            let id = distinct_members(normalize(id, true));
            filter.insert(ID_FIELD, id);
        }

        filter
    }

    fn budget(&self, schema: &EntitySchema, requested: Option<RecursionBudget>) -> RecursionBudget {
        requested
            .or_else(|| self.config.recursive.map(RecursionBudget::new))
            .unwrap_or_else(|| RecursionBudget::new(schema.default_recursive()))
    }

    fn external(&self, value: Bson) -> Bson {
        if self.config.set_string_id {
            to_external(&value)
        } else {
            value
        }
    }
}

/// Drops repeated `$in` members. Both forms of an identifier are the same
/// member once normalized.
fn distinct_members(value: Bson) -> Bson {
    let Bson::Document(mut operators) = value else {
        return value;
    };

    if let Some(Bson::Array(members)) = operators.get_mut(IN_OPERATOR) {
        let mut distinct: Vec<Bson> = Vec::with_capacity(members.len());
        for member in members.drain(..) {
            if !distinct.contains(&member) {
                distinct.push(member);
            }
        }
        *members = distinct;
    }

    Bson::Document(operators)
}

/// The document `data` is inserted as: the primary key, when given, is stored
/// under `_id` in canonical form.
fn insertable(schema: &EntitySchema, data: Document) -> Document {
    let (id, mut document) = split_primary_key(schema, data);

    if let Some(id) = id {
        document.insert(ID_FIELD, normalize(&id, false));
    }

    document
}

/// Strips the alias from `data` and splits off a non-empty primary key value.
fn split_primary_key(schema: &EntitySchema, data: Document) -> (Option<Bson>, Document) {
    let mut data = strip_alias(&data, schema.alias());
    let id = [schema.primary_key_field(), ID_FIELD]
        .map(|field| data.remove(field))
        .into_iter()
        .flatten()
        .find(|value| !matches!(value, Bson::Null) && value.as_str() != Some(""));

    (id, data)
}

/// Maps a field name of `schema` to its store field name.
fn store_field(schema: &EntitySchema, field: &str) -> String {
    let field = strip_alias_values([field], schema.alias())
        .pop()
        .unwrap_or_default();

    if field == schema.primary_key_field() {
        ID_FIELD.to_string()
    } else {
        field
    }
}

fn projection(schema: &EntitySchema, fields: &[String]) -> Option<Document> {
    if fields.is_empty() {
        return None;
    }

    Some(
        fields
            .iter()
            .map(|field| (store_field(schema, field), Bson::Int32(1)))
            .collect(),
    )
}

fn sort_document(schema: &EntitySchema, order: &[Sort]) -> Option<Document> {
    if order.is_empty() {
        return None;
    }

    Some(
        order
            .iter()
            .map(|sort| {
                (
                    store_field(schema, &sort.field),
                    Bson::Int32(sort.direction.as_i32()),
                )
            })
            .collect(),
    )
}
