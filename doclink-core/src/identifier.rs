//! Conversion between canonical document identifiers and their external string form.
//!
//! The store identifies documents with a [`ObjectId`]; callers see the 24 character
//! hex string. Conversion towards the canonical form is best effort: only strings of
//! exactly [`ID_LENGTH`] characters that parse as an object id are converted, every
//! other value is returned untouched.

use bson::{Bson, Document, doc, oid::ObjectId};

/// Length of the external (hex) form of a canonical identifier.
pub const ID_LENGTH: usize = 24;

/// The "value is one of" filter operator.
pub const IN_OPERATOR: &str = "$in";

/// Returns `true` when `value` is the external form of a canonical identifier.
pub fn is_identifier(value: &str) -> bool {
    value.len() == ID_LENGTH && ObjectId::parse_str(value).is_ok()
}

/// Converts identifier strings inside `value` to their canonical form.
///
/// Arrays and documents are walked recursively. When `in_condition` is set and
/// `value` is a non-empty array, the converted array is wrapped as
/// `{"$in": [...]}`. Nested values are never wrapped, which keeps the function
/// idempotent.
///
/// ```ignore
/// use bson::{Bson, doc};
/// use doclink::identifier::normalize;
///
/// let filter = normalize(&Bson::from(vec!["5f1d7c2b9a1e4c3b2a1d0e9f"]), true);
/// assert!(filter.as_document().unwrap().contains_key("$in"));
/// ```
pub fn normalize(value: &Bson, in_condition: bool) -> Bson {
    match value {
        Bson::String(s) if s.len() == ID_LENGTH => ObjectId::parse_str(s)
            .map(Bson::ObjectId)
            .unwrap_or_else(|_| value.clone()),
        Bson::Array(items) => {
            let converted = items
                .iter()
                .map(|item| normalize(item, false))
                .collect::<Vec<_>>();

            if in_condition && !converted.is_empty() {
                Bson::Document(doc! { IN_OPERATOR: converted })
            } else {
                Bson::Array(converted)
            }
        }
        Bson::Document(document) => Bson::Document(normalize_document(document)),
        _ => value.clone(),
    }
}

fn normalize_document(document: &Document) -> Document {
    document
        .iter()
        .map(|(key, value)| (key.clone(), normalize(value, false)))
        .collect()
}

/// Converts every canonical identifier inside `value` to its external string form.
pub fn to_external(value: &Bson) -> Bson {
    match value {
        Bson::ObjectId(oid) => Bson::String(oid.to_hex()),
        Bson::Array(items) => Bson::Array(items.iter().map(to_external).collect()),
        Bson::Document(document) => Bson::Document(
            document
                .iter()
                .map(|(key, value)| (key.clone(), to_external(value)))
                .collect(),
        ),
        _ => value.clone(),
    }
}
