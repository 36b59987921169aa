//! Merging of related record sets into a primary result set.
//!
//! Keys are compared in their external string form, so a canonical identifier and
//! its hex string match each other. Attached records are folded with
//! [`Record::into_nested`], which keeps the associations a related read resolved.

use bson::{Bson, Document, doc};
use std::collections::{HashMap, HashSet};

use crate::{
    identifier::{IN_OPERATOR, normalize, to_external},
    record::Record,
};

/// The key `value` is compared by during a merge, or `None` when it is not usable as a key.
pub fn match_key(value: &Bson) -> Option<String> {
    match value {
        Bson::ObjectId(oid) => Some(oid.to_hex()),
        Bson::String(s) if !s.is_empty() => Some(s.clone()),
        Bson::Int32(n) => Some(n.to_string()),
        Bson::Int64(n) => Some(n.to_string()),
        Bson::Double(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Collects the distinct values of `alias.field` across `records`, in first-seen order.
pub fn collect_keys(records: &[Record], alias: &str, field: &str) -> Vec<Bson> {
    let mut seen = HashSet::new();

    records
        .iter()
        .filter_map(|record| record.value(alias, field))
        .filter(|value| match_key(value).is_some_and(|key| seen.insert(key)))
        .cloned()
        .collect()
}

/// Builds a `{"$in": [...]}` filter matching `keys` in both identifier forms.
pub fn membership(keys: &[Bson]) -> Bson {
    let mut members = Vec::with_capacity(keys.len() * 2);

    for key in keys {
        for form in [normalize(key, false), to_external(key)] {
            if !members.contains(&form) {
                members.push(form);
            }
        }
    }

    Bson::Document(doc! { IN_OPERATOR: members })
}

/// An equality link between owner records and related records.
#[derive(Debug, Clone, Copy)]
pub struct Link<'a> {
    /// Alias the owner fields live under.
    pub owner_alias: &'a str,
    /// Owner field compared with `related_key`.
    pub owner_key: &'a str,
    /// Alias the related fields live under.
    pub related_alias: &'a str,
    pub related_key: &'a str,
    /// Alias under which the result is attached.
    pub name: &'a str,
}

/// Attaches to every owner the list of related records whose key equals the owner's.
///
/// Owners without matches get an empty list. Related order is kept.
pub fn attach_many(primary: &mut [Record], related: Vec<Record>, link: Link<'_>) {
    let mut groups: HashMap<String, Vec<Bson>> = HashMap::new();

    for record in related {
        if let Some(key) = record
            .value(link.related_alias, link.related_key)
            .and_then(match_key)
        {
            groups
                .entry(key)
                .or_default()
                .push(Bson::Document(record.into_nested(link.related_alias)));
        }
    }

    for record in primary.iter_mut() {
        let group = record
            .value(link.owner_alias, link.owner_key)
            .and_then(match_key)
            .and_then(|key| groups.get(&key))
            .cloned()
            .unwrap_or_default();

        record.insert(link.name, group);
    }
}

/// Attaches to every owner the first related record whose key equals the
/// owner's, or `{}`. Serves hasOne and belongsTo.
///
/// For belongsTo, `link.owner_key` is the owner's foreign key and
/// `link.related_key` the parent's primary key.
///
/// When several records share a key the first one in related order is kept,
/// not the last, so a hasOne follows the association's order.
pub fn attach_first(primary: &mut [Record], related: Vec<Record>, link: Link<'_>) {
    let mut index: HashMap<String, Document> = HashMap::new();

    for record in related {
        if let Some(key) = record
            .value(link.related_alias, link.related_key)
            .and_then(match_key)
        {
            index
                .entry(key)
                .or_insert_with(|| record.into_nested(link.related_alias));
        }
    }

    for record in primary.iter_mut() {
        let matched = record
            .value(link.owner_alias, link.owner_key)
            .and_then(match_key)
            .and_then(|key| index.get(&key))
            .cloned()
            .unwrap_or_default();

        record.insert(link.name, matched);
    }
}

/// Field names correlating the three record sets of a many-to-many merge.
#[derive(Debug, Clone, Copy)]
pub struct MergeKeys<'a> {
    pub owner_alias: &'a str,
    /// Owner primary key.
    pub owner_key: &'a str,
    pub join_alias: &'a str,
    /// Join field holding the owner's key.
    pub join_foreign_key: &'a str,
    /// Join field holding the related record's key.
    pub join_association_foreign_key: &'a str,
    pub related_alias: &'a str,
    /// Related primary key.
    pub related_key: &'a str,
    /// Alias under which the result is attached.
    pub name: &'a str,
}

/// Attaches related records to every owner through the join rows.
///
/// Matches follow join order. A join row pointing at a missing related record
/// contributes nothing, duplicate join rows contribute duplicates, and owners
/// without join rows get an empty list.
pub fn merge_many_to_many(
    primary: &mut [Record],
    join_rows: &[Record],
    related: Vec<Record>,
    keys: MergeKeys<'_>,
) {
    let mut index: HashMap<String, Vec<Bson>> = HashMap::new();

    for record in related {
        if let Some(key) = record
            .value(keys.related_alias, keys.related_key)
            .and_then(match_key)
        {
            index
                .entry(key)
                .or_default()
                .push(Bson::Document(record.into_nested(keys.related_alias)));
        }
    }

    let links = join_rows
        .iter()
        .filter_map(|row| {
            let owner = row
                .value(keys.join_alias, keys.join_foreign_key)
                .and_then(match_key)?;
            let related = row
                .value(keys.join_alias, keys.join_association_foreign_key)
                .and_then(match_key)?;

            Some((owner, related))
        })
        .collect::<Vec<_>>();

    for record in primary.iter_mut() {
        let owner = record
            .value(keys.owner_alias, keys.owner_key)
            .and_then(match_key);

        let matches = owner
            .map(|owner| {
                links
                    .iter()
                    .filter(|(join_owner, _)| *join_owner == owner)
                    .filter_map(|(_, related)| index.get(related))
                    .flatten()
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        record.insert(keys.name, matches);
    }
}
