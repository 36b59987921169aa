//! Translation of relational condition maps into store filters.
//!
//! A condition map pairs field paths with either a value (equality), a list of
//! values ("is one of"), or a store-native operator document which is left for
//! the store to interpret.

use bson::{Bson, Document, doc};

use crate::identifier::IN_OPERATOR;

/// Translates a condition map into a filter document.
///
/// Array values become `{"$in": [...]}`. Every other value, including nested
/// documents whose keys look positional (`"0"`, `"1"`), is copied unchanged.
/// Keys that are themselves operators (`$or`, `$and`) keep their operand lists.
///
/// ```ignore
/// use bson::doc;
/// use doclink::condition::translate;
///
/// assert_eq!(translate(&doc! { "age": [1, 2, 3] }), doc! { "age": { "$in": [1, 2, 3] } });
/// assert_eq!(translate(&doc! { "age": 5 }), doc! { "age": 5 });
/// ```
pub fn translate(conditions: &Document) -> Document {
    conditions
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Bson::Array(values) if !is_operator(key) => {
                    Bson::Document(doc! { IN_OPERATOR: values.clone() })
                }
                _ => value.clone(),
            };

            (key.clone(), value)
        })
        .collect()
}

/// Returns `true` for store-native operator keys such as `$set` or `$or`.
pub fn is_operator(key: &str) -> bool {
    key.starts_with('$')
}

/// Removes the `Alias.` prefix from the keys of `conditions`, descending into
/// nested documents and arrays of documents (`$or` branches).
pub fn strip_alias(conditions: &Document, alias: &str) -> Document {
    let prefix = format!("{alias}.");

    strip_keys(conditions, &prefix)
}

fn strip_keys(document: &Document, prefix: &str) -> Document {
    document
        .iter()
        .map(|(key, value)| {
            let key = key.strip_prefix(prefix).unwrap_or(key).to_string();

            (key, strip_value(value, prefix))
        })
        .collect()
}

fn strip_value(value: &Bson, prefix: &str) -> Bson {
    match value {
        Bson::Document(document) => Bson::Document(strip_keys(document, prefix)),
        Bson::Array(items) => Bson::Array(items.iter().map(|item| strip_value(item, prefix)).collect()),
        _ => value.clone(),
    }
}

/// Removes the `Alias.` prefix from field names such as a field list or order keys.
pub fn strip_alias_values<'a>(fields: impl IntoIterator<Item = &'a str>, alias: &str) -> Vec<String> {
    let prefix = format!("{alias}.");

    fields
        .into_iter()
        .map(|field| field.strip_prefix(&prefix).unwrap_or(field).to_string())
        .collect()
}
