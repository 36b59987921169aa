//! Association resolution.
//!
//! Each [`AssociationKind`] has its own resolution function. Related records are
//! fetched through [`DocumentSource::read_records`] with the descended budget, so
//! their own associations are resolved by the related read before the merge.

use bson::{Bson, Document};
use tracing::debug;

use crate::{
    backend::StoreBackend,
    condition::{strip_alias, strip_alias_values},
    error::{DocumentStoreError, DocumentStoreResult},
    merge::{
        Link, MergeKeys, attach_first, attach_many, collect_keys, membership,
        merge_many_to_many,
    },
    query::{ReadQuery, RecursionBudget, Sort},
    record::Record,
    schema::{Association, AssociationKind, JoinCollection, SchemaRegistry},
    source::DocumentSource,
};

impl<B: StoreBackend, S: SchemaRegistry> DocumentSource<B, S> {
    /// Fetches the records of `association` and merges them into `records`.
    ///
    /// `owner` is the alias of the entity declaring the association and `budget`
    /// the budget of the read that produced `records`. Nothing is queried and
    /// nothing is attached when the records carry no key to look up.
    ///
    /// # Errors
    ///
    /// Any failure is returned as [`DocumentStoreError::AssociationFetchFailed`].
    pub async fn resolve(
        &self,
        owner: &str,
        association: &Association,
        records: &mut [Record],
        budget: RecursionBudget,
    ) -> DocumentStoreResult<()> {
        let result = match &association.kind {
            AssociationKind::HasMany => self.has_many(owner, association, records, budget).await,
            AssociationKind::HasOne => self.has_one(owner, association, records, budget).await,
            AssociationKind::BelongsTo => self.belongs_to(owner, association, records, budget).await,
            AssociationKind::ManyToMany(join) => {
                self.many_to_many(owner, association, join, records, budget)
                    .await
            }
        };

        result.map_err(|err| DocumentStoreError::association(&association.name, err))
    }

    async fn has_many(
        &self,
        owner: &str,
        association: &Association,
        records: &mut [Record],
        budget: RecursionBudget,
    ) -> DocumentStoreResult<()> {
        let primary_key = self.entity(owner)?.primary_key_field();
        let foreign_key = association.foreign_key_field(owner);

        let Some(related) = self
            .fetch_children(owner, association, records, primary_key, &foreign_key, budget)
            .await?
        else {
            return Ok(());
        };

        attach_many(
            records,
            related,
            Link {
                owner_alias: owner,
                owner_key: primary_key,
                related_alias: &association.related,
                related_key: &foreign_key,
                name: &association.name,
            },
        );

        Ok(())
    }

    async fn has_one(
        &self,
        owner: &str,
        association: &Association,
        records: &mut [Record],
        budget: RecursionBudget,
    ) -> DocumentStoreResult<()> {
        let primary_key = self.entity(owner)?.primary_key_field();
        let foreign_key = association.foreign_key_field(owner);

        let Some(related) = self
            .fetch_children(owner, association, records, primary_key, &foreign_key, budget)
            .await?
        else {
            return Ok(());
        };

        attach_first(
            records,
            related,
            Link {
                owner_alias: owner,
                owner_key: primary_key,
                related_alias: &association.related,
                related_key: &foreign_key,
                name: &association.name,
            },
        );

        Ok(())
    }

    async fn belongs_to(
        &self,
        owner: &str,
        association: &Association,
        records: &mut [Record],
        budget: RecursionBudget,
    ) -> DocumentStoreResult<()> {
        let foreign_key = association.foreign_key_field(owner);
        let related_key = self.entity(&association.related)?.primary_key_field();

        let keys = collect_keys(records, owner, &foreign_key);
        if keys.is_empty() {
            debug!(owner, association = %association.name, "no foreign keys, skipping");
            return Ok(());
        }

        let query = related_query(association, related_key, &keys, budget);
        let related = self
            .read_records(&association.related, query)
            .await?;

        attach_first(
            records,
            related,
            Link {
                owner_alias: owner,
                owner_key: &foreign_key,
                related_alias: &association.related,
                related_key,
                name: &association.name,
            },
        );

        Ok(())
    }

    async fn many_to_many(
        &self,
        owner: &str,
        association: &Association,
        join: &JoinCollection,
        records: &mut [Record],
        budget: RecursionBudget,
    ) -> DocumentStoreResult<()> {
        let primary_key = self.entity(owner)?.primary_key_field();
        let related_key = self.entity(&association.related)?.primary_key_field();
        let join_foreign_key = association.foreign_key_field(owner);
        let join_association_foreign_key = association
            .association_foreign_key_field()
            .unwrap_or_default();

        let keys = collect_keys(records, owner, primary_key);
        if keys.is_empty() {
            debug!(owner, association = %association.name, "no primary keys, skipping");
            return Ok(());
        }

        let mut conditions = Document::new();
        conditions.insert(join_foreign_key.as_str(), membership(&keys));

        let join_query = ReadQuery {
            conditions,
            recursive: Some(RecursionBudget::NONE),
            ..ReadQuery::default()
        };
        let join_rows = self
            .read_records(&join.entity, join_query)
            .await?;

        let related_keys = collect_keys(&join_rows, &join.entity, &join_association_foreign_key);
        if related_keys.is_empty() {
            debug!(owner, association = %association.name, "no join rows, skipping");
            return Ok(());
        }

        let query = related_query(association, related_key, &related_keys, budget);
        let related = self
            .read_records(&association.related, query)
            .await?;

        merge_many_to_many(
            records,
            &join_rows,
            related,
            MergeKeys {
                owner_alias: owner,
                owner_key: primary_key,
                join_alias: &join.entity,
                join_foreign_key: &join_foreign_key,
                join_association_foreign_key: &join_association_foreign_key,
                related_alias: &association.related,
                related_key,
                name: &association.name,
            },
        );

        Ok(())
    }

    /// Reads the related records whose `foreign_key` holds an owner's `owner_key`.
    ///
    /// Returns `None` when the owners carry no key.
    async fn fetch_children(
        &self,
        owner: &str,
        association: &Association,
        records: &[Record],
        owner_key: &str,
        foreign_key: &str,
        budget: RecursionBudget,
    ) -> DocumentStoreResult<Option<Vec<Record>>> {
        let keys = collect_keys(records, owner, owner_key);
        if keys.is_empty() {
            debug!(owner, association = %association.name, "no primary keys, skipping");
            return Ok(None);
        }

        let query = related_query(association, foreign_key, &keys, budget);
        let related = self
            .read_records(&association.related, query)
            .await?;

        Ok(Some(related))
    }
}

/// Builds the related read of `association`: `key_field` is one of `keys`, merged
/// with the association's own conditions, one level deeper than `budget`.
///
/// The association's conditions, fields and order may be prefixed with its name,
/// which differs from the related alias when the association is renamed.
fn related_query(
    association: &Association,
    key_field: &str,
    keys: &[Bson],
    budget: RecursionBudget,
) -> ReadQuery {
    let mut conditions = Document::new();
    conditions.insert(key_field, membership(keys));
    for (field, value) in strip_alias(&association.conditions, &association.name) {
        conditions.insert(field, value);
    }

    let mut fields = strip_alias_values(association.fields.iter().map(String::as_str), &association.name);
    if !fields.is_empty() && !fields.iter().any(|field| field == key_field) {
        fields.push(key_field.to_string());
    }

    ReadQuery {
        conditions,
        fields,
        order: association
            .order
            .iter()
            .zip(strip_alias_values(association.order.iter().map(|sort| sort.field.as_str()), &association.name))
            .map(|(sort, field)| Sort::new(field, sort.direction))
            .collect(),
        limit: association.limit,
        offset: None,
        page: None,
        recursive: Some(budget.descend()),
    }
}
