//! Alias-qualified result records.
//!
//! A [`Record`] groups values by alias: the primary entity's fields live under its
//! alias, and every resolved association adds an entry under the association name
//! (a document for single-valued associations, an array for collections).
//!
//! ```ignore
//! {
//!     "Vehicle": { "id": "513a...", "name": "Corvette" },
//!     "VehiclePart": [{ "id": "513b...", "vehicle_id": "513a..." }],
//! }
//! ```

use bson::{Bson, Document};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Document);

impl Record {
    /// Creates a record holding `fields` under `alias`.
    pub fn new(alias: impl Into<String>, fields: Document) -> Self {
        let mut entries = Document::new();
        entries.insert(alias.into(), fields);

        Self(entries)
    }

    /// Returns the value stored under `alias`.
    pub fn get(&self, alias: &str) -> Option<&Bson> {
        self.0.get(alias)
    }

    /// Returns the field document stored under `alias`.
    pub fn fields(&self, alias: &str) -> Option<&Document> {
        self.0
            .get(alias)
            .and_then(Bson::as_document)
    }

    /// Returns the list of documents stored under `alias`.
    pub fn many(&self, alias: &str) -> Option<&Vec<Bson>> {
        self.0
            .get(alias)
            .and_then(Bson::as_array)
    }

    /// Returns `field` of the document stored under `alias`.
    pub fn value(&self, alias: &str, field: &str) -> Option<&Bson> {
        self.fields(alias)
            .and_then(|fields| fields.get(field))
    }

    /// Stores `value` under `alias`, replacing any previous entry.
    pub fn insert(&mut self, alias: impl Into<String>, value: impl Into<Bson>) {
        self.0.insert(alias.into(), value.into());
    }

    /// Returns the aliases present in this record.
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Returns the fields under `alias` with every other alias folded in as a field.
    ///
    /// This is the shape a record takes once it is attached to another record:
    /// `{"VehiclePart": {...}, "Vehicle": {...}}` becomes `{..., "Vehicle": {...}}`.
    pub fn into_nested(self, alias: &str) -> Document {
        let mut nested = match self.0.get(alias) {
            Some(Bson::Document(fields)) => fields.clone(),
            _ => Document::new(),
        };

        for (key, value) in self.0 {
            if key != alias {
                nested.insert(key, value);
            }
        }

        nested
    }

    pub fn as_document(&self) -> &Document {
        &self.0
    }

    pub fn into_document(self) -> Document {
        self.0
    }
}

impl From<Document> for Record {
    fn from(document: Document) -> Self {
        Self(document)
    }
}

impl From<Record> for Bson {
    fn from(record: Record) -> Self {
        Bson::Document(record.0)
    }
}
