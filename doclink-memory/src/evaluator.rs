//! Filter evaluation for in-memory document matching.
//!
//! This module evaluates store-native filter documents such as
//! `{"age": {"$gte": 18}, "$or": [{"name": "a"}, {"name": "b"}]}` against BSON
//! documents.

use std::{cmp::Ordering, collections::HashMap};
use bson::{Bson, Document, datetime::DateTime, oid::ObjectId};

use doclink_core::error::{DocumentStoreError, DocumentStoreResult};


/// Type-erased, comparable representation of BSON values.
///
/// This enum wraps BSON values and provides comparison operations for
/// filtering queries. It normalizes numeric types to f64 for easy comparison.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// Numeric value (all integers and floats normalized to f64)
    Number(f64),
    /// DateTime value
    DateTime(DateTime),
    /// Object identifier
    ObjectId(ObjectId),
    /// String value
    String(&'a str),
    /// Array of comparable values
    Array(Vec<Comparable<'a>>),
    /// Map/Object of comparable values
    Map(HashMap<&'a str, Comparable<'a>>),
}

impl<'a> Comparable<'a> {
    /// Position of the value's type in the cross-type sort order.
    pub fn rank(&self) -> u8 {
        match self {
            Comparable::Null => 0,
            Comparable::Number(_) => 1,
            Comparable::String(_) => 2,
            Comparable::Map(_) => 3,
            Comparable::Array(_) => 4,
            Comparable::ObjectId(_) => 5,
            Comparable::Bool(_) => 6,
            Comparable::DateTime(_) => 7,
        }
    }

    /// Total order used for sorting: values of different types order by type.
    pub fn sort_cmp(&self, other: &Self) -> Ordering {
        self.partial_cmp(other)
            .unwrap_or_else(|| self.rank().cmp(&other.rank()))
    }
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::ObjectId(value) => Comparable::ObjectId(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(arr) => Comparable::Array(
                arr
                    .iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>()
            ),
            Bson::Document(doc) => Comparable::Map(
                doc
                    .iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<HashMap<_, _>>()
            ),
            _ => Comparable::Null, // Other types are not comparable
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => Some(Ordering::Equal),
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a.bytes().partial_cmp(&b.bytes()),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}


/// Returns the value at a dotted `path` of `document`.
pub(crate) fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;

    for segment in segments {
        current = current.as_document()?.get(segment)?;
    }

    Some(current)
}


/// Matches documents against a filter document.
pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Document,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    /// Returns `true` when the document satisfies every clause of `filter`.
    pub fn matches(&self, filter: &Document) -> DocumentStoreResult<bool> {
        for (key, value) in filter {
            if !self.clause(key, value)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    pub fn filter_documents(
        documents: impl IntoIterator<Item = &'a Document>,
        filter: &Document,
    ) -> DocumentStoreResult<Vec<Document>> {
        let mut matched = Vec::new();

        for document in documents {
            if DocumentEvaluator::new(document).matches(filter)? {
                matched.push(document.clone());
            }
        }

        Ok(matched)
    }

    fn clause(&self, key: &str, value: &Bson) -> DocumentStoreResult<bool> {
        match key {
            "$and" => {
                for branch in branches(key, value)? {
                    if !self.matches(branch)? {
                        return Ok(false);
                    }
                }

                Ok(true)
            }
            "$or" => {
                for branch in branches(key, value)? {
                    if self.matches(branch)? {
                        return Ok(true);
                    }
                }

                Ok(false)
            }
            "$nor" => {
                for branch in branches(key, value)? {
                    if self.matches(branch)? {
                        return Ok(false);
                    }
                }

                Ok(true)
            }
            _ if key.starts_with('$') => Err(DocumentStoreError::UnsupportedOperator(key.to_string())),
            _ => {
                let found = lookup(self.document, key);

                match value {
                    Bson::Document(operators) if is_operator_document(operators) => {
                        field_matches(found, operators)
                    }
                    _ => Ok(equals(found, value)),
                }
            }
        }
    }
}

fn branches<'b>(operator: &str, value: &'b Bson) -> DocumentStoreResult<Vec<&'b Document>> {
    let invalid = || DocumentStoreError::InvalidDocument(format!("{operator} expects an array of documents"));

    value
        .as_array()
        .ok_or_else(invalid)?
        .iter()
        .map(|branch| branch.as_document().ok_or_else(invalid))
        .collect()
}

fn is_operator_document(document: &Document) -> bool {
    document
        .keys()
        .next()
        .is_some_and(|key| key.starts_with('$'))
}

fn field_matches(found: Option<&Bson>, operators: &Document) -> DocumentStoreResult<bool> {
    for (operator, operand) in operators {
        let matched = match operator.as_str() {
            "$eq" => equals(found, operand),
            "$ne" => !equals(found, operand),
            "$gt" => compare(found, operand, |ordering| ordering == Ordering::Greater),
            "$gte" => compare(found, operand, |ordering| ordering != Ordering::Less),
            "$lt" => compare(found, operand, |ordering| ordering == Ordering::Less),
            "$lte" => compare(found, operand, |ordering| ordering != Ordering::Greater),
            "$in" => members(operator, operand)?
                .iter()
                .any(|member| equals(found, member)),
            "$nin" => !members(operator, operand)?
                .iter()
                .any(|member| equals(found, member)),
            "$exists" => found.is_some() == truthy(operand),
            "$not" => match operand {
                Bson::Document(inner) => !field_matches(found, inner)?,
                _ => return Err(DocumentStoreError::InvalidDocument("$not expects a document".to_string())),
            },
            _ => return Err(DocumentStoreError::UnsupportedOperator(operator.clone())),
        };

        if !matched {
            return Ok(false);
        }
    }

    Ok(true)
}

fn members<'b>(operator: &str, operand: &'b Bson) -> DocumentStoreResult<&'b Vec<Bson>> {
    operand
        .as_array()
        .ok_or_else(|| DocumentStoreError::InvalidDocument(format!("{operator} expects an array")))
}

/// Equality with array membership: an array field matches a scalar it contains.
fn equals(found: Option<&Bson>, value: &Bson) -> bool {
    match found {
        None => matches!(value, Bson::Null),
        Some(Bson::Array(items)) if !matches!(value, Bson::Array(_)) => {
            let value = Comparable::from(value);

            items
                .iter()
                .any(|item| Comparable::from(item) == value)
        }
        Some(found) => Comparable::from(found) == Comparable::from(value),
    }
}

fn compare(found: Option<&Bson>, operand: &Bson, predicate: impl Fn(Ordering) -> bool) -> bool {
    let operand = Comparable::from(operand);
    let check = |value: &Bson| {
        Comparable::from(value)
            .partial_cmp(&operand)
            .is_some_and(&predicate)
    };

    match found {
        None => false,
        Some(Bson::Array(items)) => items.iter().any(check),
        Some(value) => check(value),
    }
}

fn truthy(value: &Bson) -> bool {
    match value {
        Bson::Boolean(value) => *value,
        Bson::Int32(value) => *value != 0,
        Bson::Int64(value) => *value != 0,
        Bson::Double(value) => *value != 0.0,
        Bson::Null => false,
        _ => true,
    }
}
