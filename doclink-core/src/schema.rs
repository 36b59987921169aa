//! Entity metadata consumed by the document source.
//!
//! Every entity is registered under its alias with the collection it lives in, its
//! logical primary key, and the associations to other entities. Keys left unset on
//! an [`Association`] follow the `snake_case(alias) + "_id"` convention.
//!
//! # Example
//!
//! ```ignore
//! use doclink::schema::{Association, EntitySchema, Schema};
//!
//! let schema = Schema::builder()
//!     .entity(
//!         EntitySchema::new("Vehicle")
//!             .collection("vehicles")
//!             .association(Association::has_many("VehiclePart"))
//!             .association(Association::many_to_many("Owner", "OwnersVehicle").foreign_key("car_id")),
//!     )
//!     .entity(EntitySchema::new("VehiclePart").association(Association::belongs_to("Vehicle")))
//!     .entity(EntitySchema::new("Owner"))
//!     .entity(EntitySchema::new("OwnersVehicle").collection("owners_vehicles"))
//!     .build();
//! ```

use bson::Document;
use convert_case::{Case, Casing};
use std::collections::HashMap;

use crate::query::Sort;

/// Default logical primary key.
pub const DEFAULT_PRIMARY_KEY: &str = "id";

/// Default recursion depth for reads.
pub const DEFAULT_RECURSIVE: i32 = 1;

/// Returns the conventional foreign key pointing at `alias` (`VehiclePart` -> `vehicle_part_id`).
pub fn foreign_key_for(alias: &str) -> String {
    format!("{}_id", alias.to_case(Case::Snake))
}

/// Intermediate collection correlating two entities of a many-to-many association.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinCollection {
    /// Alias of the join entity.
    pub entity: String,
    /// Join field holding the related entity's key. Defaults to the related entity's foreign key name.
    pub association_foreign_key: Option<String>,
}

/// The kind of an association.
#[derive(Debug, Clone, PartialEq)]
pub enum AssociationKind {
    /// One owner, many related records carrying the owner's key.
    HasMany,
    /// One owner, at most one related record carrying the owner's key.
    HasOne,
    /// The owner carries the related record's key.
    BelongsTo,
    /// Owner and related records are correlated through a join collection.
    ManyToMany(JoinCollection),
}

/// Declarative description of how an entity relates to another one.
#[derive(Debug, Clone, PartialEq)]
pub struct Association {
    /// Alias under which resolved records are attached.
    pub name: String,
    /// Alias of the related entity.
    pub related: String,
    pub kind: AssociationKind,
    /// Foreign key field. For many-to-many it is the join field holding the owner's key.
    pub foreign_key: Option<String>,
    /// Extra conditions for the related query.
    pub conditions: Document,
    pub order: Vec<Sort>,
    pub limit: Option<i64>,
    /// Related fields to fetch. Empty fetches whole documents.
    pub fields: Vec<String>,
}

impl Association {
    /// Creates an association of `kind` named `name` pointing at the entity of the same alias.
    pub fn new(name: impl Into<String>, kind: AssociationKind) -> Self {
        let name = name.into();

        Self {
            related: name.clone(),
            name,
            kind,
            foreign_key: None,
            conditions: Document::new(),
            order: Vec::new(),
            limit: None,
            fields: Vec::new(),
        }
    }

    pub fn has_many(name: impl Into<String>) -> Self {
        Self::new(name, AssociationKind::HasMany)
    }

    pub fn has_one(name: impl Into<String>) -> Self {
        Self::new(name, AssociationKind::HasOne)
    }

    pub fn belongs_to(name: impl Into<String>) -> Self {
        Self::new(name, AssociationKind::BelongsTo)
    }

    /// Creates a many-to-many association going through the `join` entity.
    pub fn many_to_many(name: impl Into<String>, join: impl Into<String>) -> Self {
        Self::new(
            name,
            AssociationKind::ManyToMany(JoinCollection {
                entity: join.into(),
                association_foreign_key: None,
            }),
        )
    }

    /// Sets the related entity when it differs from the association name.
    pub fn related(mut self, related: impl Into<String>) -> Self {
        self.related = related.into();
        self
    }

    pub fn foreign_key(mut self, field: impl Into<String>) -> Self {
        self.foreign_key = Some(field.into());
        self
    }

    /// Sets the join field holding the related key. Ignored unless many-to-many.
    pub fn association_foreign_key(mut self, field: impl Into<String>) -> Self {
        if let AssociationKind::ManyToMany(join) = &mut self.kind {
            join.association_foreign_key = Some(field.into());
        }
        self
    }

    pub fn conditions(mut self, conditions: Document) -> Self {
        self.conditions = conditions;
        self
    }

    pub fn order(mut self, sort: Sort) -> Self {
        self.order.push(sort);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn fields<I, F>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Resolves the foreign key field for an association declared on `owner`.
    ///
    /// belongsTo points at the related entity, every other kind at the owner.
    pub fn foreign_key_field(&self, owner: &str) -> String {
        match (&self.foreign_key, &self.kind) {
            (Some(field), _) => field.clone(),
            (None, AssociationKind::BelongsTo) => foreign_key_for(&self.related),
            (None, _) => foreign_key_for(owner),
        }
    }

    /// Resolves the join field holding the related entity's key.
    pub fn association_foreign_key_field(&self) -> Option<String> {
        match &self.kind {
            AssociationKind::ManyToMany(join) => Some(
                join.association_foreign_key
                    .clone()
                    .unwrap_or_else(|| foreign_key_for(&self.related)),
            ),
            _ => None,
        }
    }
}

/// Metadata of one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySchema {
    alias: String,
    collection: String,
    primary_key: String,
    associations: Vec<Association>,
    no_set_operator: Option<String>,
    recursive: i32,
}

impl EntitySchema {
    /// Creates an entity stored in `snake_case(alias)` with primary key `id`.
    pub fn new(alias: impl Into<String>) -> Self {
        let alias = alias.into();

        Self {
            collection: alias.to_case(Case::Snake),
            alias,
            primary_key: DEFAULT_PRIMARY_KEY.to_string(),
            associations: Vec::new(),
            no_set_operator: None,
            recursive: DEFAULT_RECURSIVE,
        }
    }

    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn primary_key(mut self, primary_key: impl Into<String>) -> Self {
        self.primary_key = primary_key.into();
        self
    }

    pub fn association(mut self, association: Association) -> Self {
        self.associations.push(association);
        self
    }

    /// Uses `operator` (for example `$inc`) instead of `$set` for updates.
    pub fn no_set_operator(mut self, operator: impl Into<String>) -> Self {
        self.no_set_operator = Some(operator.into());
        self
    }

    /// Sets the recursion depth used when a read does not ask for one.
    pub fn recursive(mut self, depth: i32) -> Self {
        self.recursive = depth;
        self
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn collection_name(&self) -> &str {
        &self.collection
    }

    pub fn primary_key_field(&self) -> &str {
        &self.primary_key
    }

    pub fn associations(&self) -> &[Association] {
        &self.associations
    }

    pub fn update_operator(&self) -> Option<&str> {
        self.no_set_operator.as_deref()
    }

    pub fn default_recursive(&self) -> i32 {
        self.recursive
    }
}

/// Source of entity metadata.
pub trait SchemaRegistry: Send + Sync {
    /// Returns the entity registered under `alias`.
    fn entity(&self, alias: &str) -> Option<&EntitySchema>;

    fn primary_key(&self, alias: &str) -> Option<&str> {
        self.entity(alias).map(EntitySchema::primary_key_field)
    }

    fn associations(&self, alias: &str) -> &[Association] {
        self.entity(alias)
            .map(EntitySchema::associations)
            .unwrap_or_default()
    }

    fn collection_name(&self, alias: &str) -> Option<&str> {
        self.entity(alias).map(EntitySchema::collection_name)
    }
}

/// Registry of entities keyed by alias.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    entities: HashMap<String, EntitySchema>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Registers `entity`, replacing any entity with the same alias.
    pub fn register(&mut self, entity: EntitySchema) {
        self.entities.insert(entity.alias.clone(), entity);
    }
}

impl SchemaRegistry for Schema {
    fn entity(&self, alias: &str) -> Option<&EntitySchema> {
        self.entities.get(alias)
    }
}

#[derive(Debug, Default)]
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    pub fn entity(mut self, entity: EntitySchema) -> Self {
        self.schema.register(entity);
        self
    }

    pub fn build(self) -> Schema {
        self.schema
    }
}
