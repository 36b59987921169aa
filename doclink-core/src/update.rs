//! Composition of update bodies for partial writes.
//!
//! Writes never replace a whole document: the payload is wrapped in a field patch
//! (`$set`) or in the store-native operator configured on the entity, and the
//! modification timestamp always travels in its own `$set` clause.

use bson::{Bson, Document, doc};

use crate::condition::is_operator;

/// The field-patch operator.
pub const SET_OPERATOR: &str = "$set";

/// Timestamp field names, in lookup order.
pub const TIMESTAMP_FIELDS: [&str; 2] = ["updated", "modified"];

/// Returns the modification timestamp field of `data`: `updated` when present, otherwise `modified`.
pub fn timestamp_field(data: &Document) -> &'static str {
    TIMESTAMP_FIELDS
        .into_iter()
        .find(|field| data.contains_key(field))
        .unwrap_or(TIMESTAMP_FIELDS[1])
}

/// Builds the update body for `data`.
///
/// - Without `no_set_operator`, a payload with no operator keys is wrapped as
///   `{"$set": data}`. A payload that already carries operator keys (for example
///   `$inc`) is kept and only its timestamp moves into `$set`.
/// - With an operator such as `$inc`, the payload minus the timestamp is wrapped
///   under it and the timestamp gets its own `$set` clause.
///
/// An operator that does not start with `$` is ignored.
///
/// ```ignore
/// use bson::doc;
/// use doclink::update::compose;
///
/// let body = compose(doc! { "$inc": { "count": 1 }, "modified": 10 }, None);
/// assert_eq!(body, doc! { "$inc": { "count": 1 }, "$set": { "modified": 10 } });
/// ```
pub fn compose(mut data: Document, no_set_operator: Option<&str>) -> Document {
    let field = timestamp_field(&data);

    match no_set_operator.filter(|operator| is_operator(operator)) {
        None => {
            if !data.keys().any(|key| is_operator(key)) {
                return doc! { SET_OPERATOR: data };
            }

            if let Some(timestamp) = take_timestamp(&mut data, field) {
                let mut patch = match data.remove(SET_OPERATOR) {
                    Some(Bson::Document(existing)) => existing,
                    _ => Document::new(),
                };
                patch.insert(field, timestamp);
                data.insert(SET_OPERATOR, patch);
            }

            data
        }
        Some(operator) => match take_timestamp(&mut data, field) {
            Some(timestamp) => doc! {
                operator: data,
                SET_OPERATOR: { field: timestamp },
            },
            None => doc! { operator: data },
        },
    }
}

fn take_timestamp(data: &mut Document, field: &str) -> Option<Bson> {
    match data.get(field) {
        Some(value) if !is_empty(value) => data.remove(field),
        _ => None,
    }
}

fn is_empty(value: &Bson) -> bool {
    match value {
        Bson::Null => true,
        Bson::String(s) => s.is_empty(),
        Bson::Array(items) => items.is_empty(),
        Bson::Document(document) => document.is_empty(),
        _ => false,
    }
}
