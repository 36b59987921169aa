//! Projection of raw store documents into alias-qualified records.

use bson::{Bson, Document};

use crate::{identifier::to_external, record::Record};

/// The store's identifier field.
pub const ID_FIELD: &str = "_id";

/// Turns a raw store document into a [`Record`] under `alias`.
///
/// The store's `_id` is renamed to `primary_key` when the two differ. With
/// `set_string_id` the identifier is converted to its external string form.
/// Documents without an `_id` (or with an empty one) are wrapped as they are.
pub fn project(mut raw: Document, primary_key: &str, alias: &str, set_string_id: bool) -> Record {
    let present = match raw.get(ID_FIELD) {
        Some(Bson::Null) | None => false,
        Some(Bson::String(s)) => !s.is_empty(),
        Some(_) => true,
    };

    if let Some(id) = present.then(|| raw.remove(ID_FIELD)).flatten() {
        let id = if set_string_id { to_external(&id) } else { id };

        raw.insert(primary_key, id);
    }

    Record::new(alias, raw)
}
