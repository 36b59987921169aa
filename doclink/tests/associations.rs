//! Association resolution over the in-memory backend.

mod common;

use bson::{Bson, Document, doc};
use doclink::prelude::*;

use common::*;

fn depth(recursive: i32) -> ReadQuery {
    ReadQuery::builder().recursive(recursive).build()
}

#[tokio::test]
async fn test_has_many_attaches_groups_in_store_order() {
    let source = source().await;
    let vehicles = source.read("Vehicle", depth(0)).await.unwrap();

    assert_eq!(vehicles.len(), 2);
    assert_eq!(names(vehicles[0].many("VehiclePart").unwrap(), "name"), vec!["wheel", "door"]);
    assert_eq!(vehicles[1].many("VehiclePart"), Some(&Vec::new()));
}

#[tokio::test]
async fn test_has_one_attaches_first_match_or_empty_record() {
    let source = source().await;
    let vehicles = source.read("Vehicle", depth(0)).await.unwrap();

    assert_eq!(vehicles[0].value("Engine", "hp"), Some(&Bson::Int32(430)));
    assert_eq!(vehicles[1].fields("Engine"), Some(&Document::new()));
}

#[tokio::test]
async fn test_belongs_to_attaches_parent_or_empty_record() {
    let source = source().await;
    let vehicles = source.read("Vehicle", depth(0)).await.unwrap();

    assert_eq!(
        vehicles[0].fields("Manufacturer"),
        Some(&doc! { "name": "Chevrolet", "id": M1 }),
    );
    assert_eq!(vehicles[1].fields("Manufacturer"), Some(&Document::new()));
}

#[tokio::test]
async fn test_many_to_many_follows_join_order() {
    let source = source().await;
    let vehicles = source.read("Vehicle", depth(0)).await.unwrap();

    let owners = vehicles[0].many("Owner").unwrap();
    assert_eq!(names(owners, "name"), vec!["Bob", "Ann"]);
    assert_eq!(names(owners, "id"), vec![O2, O1]);
    assert_eq!(vehicles[1].many("Owner"), Some(&Vec::new()));
}

#[tokio::test]
async fn test_missing_keys_issue_no_query() {
    let source = source().await;
    let parts = source
        .read(
            "VehiclePart",
            ReadQuery::builder()
                .condition("VehiclePart.id", 3)
                .recursive(1)
                .build(),
        )
        .await
        .unwrap();

    assert_eq!(parts.len(), 1);
    assert!(parts[0].get("Vehicle").is_none());
    assert_eq!(source.backend().find_count(), 1);
}

#[tokio::test]
async fn test_exhausted_budget_resolves_nothing() {
    let source = source().await;
    let vehicles = source.read("Vehicle", depth(-1)).await.unwrap();

    assert_eq!(vehicles[0].aliases().collect::<Vec<_>>(), vec!["Vehicle"]);
    assert_eq!(source.backend().find_count(), 1);
}

#[tokio::test]
async fn test_depth_zero_attaches_without_nesting() {
    let source = source().await;
    let vehicles = source.read("Vehicle", depth(0)).await.unwrap();

    for part in vehicles[0].many("VehiclePart").unwrap() {
        assert!(!part.as_document().unwrap().contains_key("Vehicle"));
    }
    assert!(!vehicles[0].fields("Manufacturer").unwrap().contains_key("Vehicle"));

    // Primary, parts, engine, manufacturer, join rows and owners.
    assert_eq!(source.backend().find_count(), 6);
}

#[tokio::test]
async fn test_depth_one_resolves_nested_associations() {
    let source = source().await;
    let vehicles = source.read("Vehicle", depth(1)).await.unwrap();

    let wheel = vehicles[0].many("VehiclePart").unwrap()[0].as_document().unwrap();
    assert_eq!(wheel.get_document("Vehicle").unwrap().get_str("name").unwrap(), "Corvette");

    let manufacturer = vehicles[0].fields("Manufacturer").unwrap();
    assert_eq!(names(manufacturer.get_array("Vehicle").unwrap(), "name"), vec!["Corvette"]);

    assert_eq!(source.backend().find_count(), 8);
}

#[tokio::test]
async fn test_default_depth_comes_from_entity() {
    let source = source().await;
    let implicit = source.read("Vehicle", ReadQuery::new()).await.unwrap();
    let explicit = source.read("Vehicle", depth(1)).await.unwrap();

    assert_eq!(implicit, explicit);
}

#[tokio::test]
async fn test_configured_depth_overrides_entity_default() {
    let source = DocumentSource::with_config(
        RecordingStore::new(garage().await),
        schema(),
        SourceConfig::default().recursive(-1),
    );

    let vehicles = source.read("Vehicle", ReadQuery::new()).await.unwrap();

    assert!(vehicles[0].get("VehiclePart").is_none());
}

#[tokio::test]
async fn test_cyclic_graph_is_bounded_by_depth() {
    let source = source().await;
    let vehicles = source.read("Vehicle", depth(2)).await.unwrap();

    let wheel = vehicles[0].many("VehiclePart").unwrap()[0].as_document().unwrap();
    let vehicle = wheel.get_document("Vehicle").unwrap();
    let parts = vehicle.get_array("VehiclePart").unwrap();

    assert_eq!(names(parts, "name"), vec!["wheel", "door"]);
    for part in parts {
        assert!(!part.as_document().unwrap().contains_key("Vehicle"));
    }
}

#[tokio::test]
async fn test_association_failure_keeps_primary_and_other_associations() {
    let source = failing_source("engines").await;
    let vehicles = source.read("Vehicle", depth(0)).await.unwrap();

    assert_eq!(vehicles.len(), 2);
    assert!(vehicles[0].get("Engine").is_none());
    assert_eq!(vehicles[0].many("VehiclePart").map(Vec::len), Some(2));
    assert_eq!(vehicles[0].many("Owner").map(Vec::len), Some(2));
    assert!(vehicles[0].fields("Manufacturer").is_some());
}

#[tokio::test]
async fn test_primary_failure_is_fatal() {
    let source = failing_source("vehicles").await;
    let result = source.read("Vehicle", depth(0)).await;

    assert!(matches!(result, Err(DocumentStoreError::StoreUnavailable(_))));
}

#[tokio::test]
async fn test_resolve_reports_failed_association() {
    let source = failing_source("engines").await;
    let mut vehicles = source.read("Vehicle", depth(-1)).await.unwrap();

    let result = source
        .resolve("Vehicle", &Association::has_one("Engine"), &mut vehicles, RecursionBudget::new(0))
        .await;

    match result {
        Err(DocumentStoreError::AssociationFetchFailed { association, source }) => {
            assert_eq!(association, "Engine");
            assert!(matches!(*source, DocumentStoreError::StoreUnavailable(_)));
        }
        other => panic!("expected an association failure, got {other:?}"),
    }
    assert!(vehicles[0].get("Engine").is_none());
}

#[tokio::test]
async fn test_unknown_related_entity_is_an_association_failure() {
    let source = source().await;
    let mut vehicles = source.read("Vehicle", depth(-1)).await.unwrap();

    let result = source
        .resolve("Vehicle", &Association::has_many("Wing"), &mut vehicles, RecursionBudget::new(0))
        .await;

    assert!(matches!(result, Err(DocumentStoreError::AssociationFetchFailed { .. })));
}

#[tokio::test]
async fn test_association_options_shape_the_related_read() {
    let source = source().await;
    let mut vehicles = source.read("Vehicle", depth(-1)).await.unwrap();

    let parts = Association::has_many("VehiclePart")
        .conditions(doc! { "VehiclePart.name": { "$ne": "wheel" } })
        .order(Sort::asc("name"))
        .fields(["name"]);

    source
        .resolve("Vehicle", &parts, &mut vehicles, RecursionBudget::new(0))
        .await
        .unwrap();

    assert_eq!(vehicles[0].many("VehiclePart").map(Vec::len), Some(1));
    let door = vehicles[0].many("VehiclePart").unwrap()[0].as_document().unwrap();
    assert_eq!(door.get_str("name").unwrap(), "door");
    assert_eq!(door.get_str("vehicle_id").unwrap(), V1);
    assert_eq!(door.get_i32("id").unwrap(), 2);
}

#[tokio::test]
async fn test_foreign_keys_match_both_identifier_forms() {
    let source = source().await;
    source
        .backend()
        .insert("vehicle_parts", doc! { "_id": 4, "name": "hood", "vehicle_id": common::oid(V2) })
        .await
        .unwrap();

    let vehicles = source.read("Vehicle", depth(0)).await.unwrap();

    assert_eq!(names(vehicles[1].many("VehiclePart").unwrap(), "name"), vec!["hood"]);
}

#[tokio::test]
async fn test_related_queries_use_membership_filters() {
    let source = source().await;
    source.read("Vehicle", depth(0)).await.unwrap();

    let finds = source.backend().finds();
    let (collection, filter) = &finds[1];

    assert_eq!(collection, "vehicle_parts");
    let members = filter.get_document("vehicle_id").unwrap().get_array("$in").unwrap();
    assert!(members.contains(&Bson::String(V1.to_string())));
    assert!(members.contains(&Bson::ObjectId(common::oid(V1))));
}

fn renamed_parent(name: &str) -> Schema {
    Schema::builder()
        .entity(
            EntitySchema::new("VehiclePart")
                .collection("vehicle_parts")
                .association(
                    Association::belongs_to("Car")
                        .related("Vehicle")
                        .foreign_key("vehicle_id")
                        .conditions(doc! { "Car.name": name }),
                ),
        )
        .entity(EntitySchema::new("Vehicle").collection("vehicles"))
        .build()
}

#[tokio::test]
async fn test_renamed_association_conditions_use_its_name() {
    let source = DocumentSource::new(RecordingStore::new(garage().await), renamed_parent("Corvette"));

    let parts = source.read("VehiclePart", depth(0)).await.unwrap();

    assert_eq!(parts[0].value("Car", "name"), Some(&Bson::from("Corvette")));
    assert_eq!(parts[1].value("Car", "id"), Some(&Bson::from(V1)));
    assert_eq!(parts[2].fields("Car"), Some(&Document::new()));

    let (collection, filter) = &source.backend().finds()[1];
    assert_eq!(collection, "vehicles");
    assert_eq!(filter, &doc! { "name": "Corvette", "_id": { "$in": [common::oid(V1)] } });
}

#[tokio::test]
async fn test_renamed_association_conditions_still_filter() {
    let source = DocumentSource::new(RecordingStore::new(garage().await), renamed_parent("Beetle"));

    let parts = source.read("VehiclePart", depth(0)).await.unwrap();

    assert!(parts.iter().all(|part| part.fields("Car") == Some(&Document::new())));
}
