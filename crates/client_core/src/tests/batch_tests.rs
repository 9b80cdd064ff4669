use super::*;
use crate::fake_inventory::FakeInventory;
use shared::domain::PropertyId;

fn category_ids(ids: &[&str]) -> Vec<CatalogueCategoryId> {
    ids.iter().map(|id| CatalogueCategoryId::new(*id)).collect()
}

fn succeeded_name(outcome: &NodeOutcome) -> &str {
    match &outcome.status {
        OutcomeStatus::Succeeded { name, .. } => name,
        other => panic!("expected success, got {other:?}"),
    }
}

fn failure_message(outcome: &NodeOutcome) -> &str {
    match &outcome.status {
        OutcomeStatus::Failed { message } => message,
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn move_renames_only_the_colliding_category() {
    let fake = FakeInventory::seeded().await;
    let tree = CatalogueCategoryTree::new(&fake);
    let spares = CatalogueCategoryId::new("cat-spares");

    let report = move_nodes(&tree, &category_ids(&["cat-pumps", "cat-valves"]), Some(&spares))
        .await
        .expect("batch");

    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.renamed(), 1);
    assert_eq!(succeeded_name(&report.outcomes[0]), "Pumps_copy_1");
    assert_eq!(succeeded_name(&report.outcomes[1]), "Valves");

    let pumps = fake.category("cat-pumps").await;
    assert_eq!(pumps.name, "Pumps_copy_1");
    assert_eq!(pumps.parent_id, Some(spares.clone()));
    assert_eq!(fake.category("cat-valves").await.parent_id, Some(spares));
}

#[tokio::test]
async fn copy_into_same_parent_assigns_distinct_suffixes() {
    let fake = FakeInventory::seeded().await;
    let tree = CatalogueCategoryTree::new(&fake);
    let vacuum = CatalogueCategoryId::new("cat-vacuum");

    let report = copy_nodes(
        &tree,
        &category_ids(&["cat-pumps", "cat-pumps", "cat-valves"]),
        Some(&vacuum),
    )
    .await
    .expect("batch");

    let names: Vec<_> = report.outcomes.iter().map(succeeded_name).collect();
    assert_eq!(names, ["Pumps_copy_1", "Pumps_copy_2", "Valves_copy_1"]);
    assert_eq!(report.renamed(), 3);

    // Originals stay where they were.
    assert_eq!(fake.category("cat-pumps").await.name, "Pumps");
    assert_eq!(fake.category("cat-valves").await.name, "Valves");
}

#[tokio::test]
async fn copied_leaf_category_keeps_its_property_definitions() {
    let fake = FakeInventory::seeded().await;
    let tree = CatalogueCategoryTree::new(&fake);

    let report = copy_nodes(&tree, &category_ids(&["cat-valves"]), None)
        .await
        .expect("batch");

    let OutcomeStatus::Succeeded { id, name, renamed } = &report.outcomes[0].status else {
        panic!("copy failed: {:?}", report.outcomes[0]);
    };
    assert_eq!(name, "Valves");
    assert!(!renamed);

    let copy = fake.category(id).await;
    assert_eq!(copy.code, "valves");
    assert!(copy.is_leaf);
    assert_eq!(copy.parent_id, None);
    let names: Vec<_> = copy.properties.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Pressure", "Model"]);
}

#[tokio::test]
async fn batch_continues_after_a_failed_node() {
    let fake = FakeInventory::seeded().await;
    let tree = CatalogueCategoryTree::new(&fake);
    let spares = CatalogueCategoryId::new("cat-spares");

    let report = move_nodes(
        &tree,
        &category_ids(&["cat-valves", "cat-missing", "cat-gauges"]),
        Some(&spares),
    )
    .await
    .expect("batch");

    assert_eq!(report.outcomes.len(), 3);
    assert!(report.outcomes[0].is_success());
    assert_eq!(
        failure_message(&report.outcomes[1]),
        "The catalogue category could not be found. It may have been deleted."
    );
    assert!(report.outcomes[2].is_success());
    assert!(!report.is_complete());
    assert_eq!(
        report.summary(),
        "Moved 2 of 3 catalogue category(s) (1 failed)"
    );
}

#[tokio::test]
async fn rejects_moves_into_self_descendants_and_leaves() {
    let fake = FakeInventory::seeded().await;
    let tree = CatalogueCategoryTree::new(&fake);

    let into_descendant = move_nodes(
        &tree,
        &category_ids(&["cat-vacuum"]),
        Some(&CatalogueCategoryId::new("cat-pumps")),
    )
    .await
    .expect("batch");
    assert_eq!(
        failure_message(&into_descendant.outcomes[0]),
        Rejection::IntoDescendant.to_string()
    );

    let into_itself = move_nodes(
        &tree,
        &category_ids(&["cat-pumps"]),
        Some(&CatalogueCategoryId::new("cat-pumps")),
    )
    .await
    .expect("batch");
    assert_eq!(
        failure_message(&into_itself.outcomes[0]),
        Rejection::IntoItself.to_string()
    );

    let into_leaf = move_nodes(
        &tree,
        &category_ids(&["cat-valves"]),
        Some(&CatalogueCategoryId::new("cat-gauges")),
    )
    .await
    .expect("batch");
    assert_eq!(
        failure_message(&into_leaf.outcomes[0]),
        Rejection::LeafDestination.to_string()
    );

    assert!(fake.writes().await.is_empty());
    assert_eq!(
        fake.category("cat-vacuum").await.parent_id,
        None,
        "rejected nodes are left untouched"
    );
}

#[tokio::test]
async fn invalid_target_fails_only_that_category() {
    let fake = FakeInventory::seeded().await;
    let tree = CatalogueCategoryTree::new(&fake);
    let pumps = CatalogueCategoryId::new("cat-pumps");

    let report = move_nodes(&tree, &category_ids(&["cat-vacuum", "cat-gauges"]), Some(&pumps))
        .await
        .expect("batch");

    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(
        failure_message(&report.outcomes[0]),
        Rejection::IntoDescendant.to_string()
    );
    assert_eq!(succeeded_name(&report.outcomes[1]), "Gauges");
    assert_eq!(report.failed(), 1);
    assert_eq!(fake.writes().await, ["PATCH category cat-gauges"]);
    assert_eq!(fake.category("cat-vacuum").await.parent_id, None);
    assert_eq!(fake.category("cat-gauges").await.parent_id, Some(pumps));
}

#[tokio::test]
async fn moving_into_current_parent_is_skipped() {
    let fake = FakeInventory::seeded().await;
    let tree = CatalogueCategoryTree::new(&fake);

    let report = move_nodes(
        &tree,
        &category_ids(&["cat-pumps", "cat-spares"]),
        Some(&CatalogueCategoryId::new("cat-vacuum")),
    )
    .await
    .expect("batch");

    assert_eq!(report.skipped(), 1);
    assert!(matches!(
        report.outcomes[0].status,
        OutcomeStatus::Skipped { .. }
    ));
    assert!(report.outcomes[1].is_success());
    assert_eq!(fake.writes().await, ["PATCH category cat-spares"]);
}

#[tokio::test]
async fn unlisted_server_conflict_retries_with_next_name() {
    let fake = FakeInventory::seeded().await;
    fake.store
        .lock()
        .await
        .hidden_names
        .insert("Pumps_copy_1".to_string());
    let tree = CatalogueCategoryTree::new(&fake);

    let report = move_nodes(
        &tree,
        &category_ids(&["cat-pumps"]),
        Some(&CatalogueCategoryId::new("cat-spares")),
    )
    .await
    .expect("batch");

    assert_eq!(succeeded_name(&report.outcomes[0]), "Pumps_copy_2");
    assert_eq!(fake.category("cat-pumps").await.name, "Pumps_copy_2");
}

#[tokio::test]
async fn names_refused_by_the_server_are_not_reissued() {
    let fake = FakeInventory::seeded().await;
    fake.store.lock().await.hidden_names.extend(
        ["Pumps_copy_1", "Pumps_copy_2", "Pumps_copy_3"].map(String::from),
    );
    let tree = CatalogueCategoryTree::new(&fake);

    let report = copy_nodes(
        &tree,
        &category_ids(&["cat-pumps", "cat-pumps"]),
        Some(&CatalogueCategoryId::new("cat-spares")),
    )
    .await
    .expect("batch");

    assert_eq!(
        failure_message(&report.outcomes[0]),
        "A catalogue category with the same name already exists."
    );
    assert_eq!(succeeded_name(&report.outcomes[1]), "Pumps_copy_4");
    assert_eq!(
        fake.store.lock().await.conflicts,
        ["Pumps_copy_1", "Pumps_copy_2", "Pumps_copy_3"]
    );
}

#[tokio::test]
async fn failed_request_gives_its_name_back() {
    let fake = FakeInventory::seeded().await;
    fake.store
        .lock()
        .await
        .fail_once
        .insert("Pumps_copy_1".to_string());
    let tree = CatalogueCategoryTree::new(&fake);

    let report = copy_nodes(
        &tree,
        &category_ids(&["cat-pumps", "cat-pumps"]),
        Some(&CatalogueCategoryId::new("cat-spares")),
    )
    .await
    .expect("batch");

    assert_eq!(
        failure_message(&report.outcomes[0]),
        crate::error::GENERIC_ERROR_MESSAGE
    );
    assert_eq!(succeeded_name(&report.outcomes[1]), "Pumps_copy_1");
}

#[tokio::test]
async fn missing_destination_fails_the_whole_batch() {
    let fake = FakeInventory::seeded().await;
    let tree = CatalogueCategoryTree::new(&fake);

    let err = move_nodes(
        &tree,
        &category_ids(&["cat-pumps"]),
        Some(&CatalogueCategoryId::new("cat-gone")),
    )
    .await
    .expect_err("destination is missing");
    assert!(err.is_not_found());
}

#[tokio::test]
async fn catalogue_items_move_only_between_compatible_leaves() {
    let fake = FakeInventory::seeded().await;
    let placement = CatalogueItemPlacement::new(&fake);
    let ids = [CatalogueItemId::new("ci-turbo-1")];

    let to_vacuum = move_nodes(&placement, &ids, Some(&CatalogueCategoryId::new("cat-vacuum")))
        .await
        .expect("batch");
    assert_eq!(
        failure_message(&to_vacuum.outcomes[0]),
        Rejection::NonLeafDestination.to_string()
    );

    let to_gauges = move_nodes(&placement, &ids, Some(&CatalogueCategoryId::new("cat-gauges")))
        .await
        .expect("batch");
    assert_eq!(
        failure_message(&to_gauges.outcomes[0]),
        Rejection::IncompatibleProperties.to_string()
    );

    let to_valves = move_nodes(&placement, &ids, Some(&CatalogueCategoryId::new("cat-valves")))
        .await
        .expect("batch");
    assert!(to_valves.is_complete());

    let moved = fake.store.lock().await.catalogue_items["ci-turbo-1"].clone();
    assert_eq!(moved.catalogue_category_id.as_str(), "cat-valves");
    let ids: Vec<_> = moved.properties.iter().map(|p| p.id.clone()).collect();
    assert_eq!(
        ids,
        [
            PropertyId::new("prop-valves-pressure"),
            PropertyId::new("prop-valves-model")
        ]
    );
    assert_eq!(
        moved.properties[1].value,
        shared::domain::PropertyValue::String("HiPace".to_string())
    );
}

#[tokio::test]
async fn catalogue_item_move_renames_only_the_colliding_item() {
    let fake = FakeInventory::seeded().await;
    {
        let mut store = fake.store.lock().await;
        let turbo = store.categories["cat-turbo"].clone();
        let valves = store.categories["cat-valves"].clone();
        let values = || {
            vec![
                shared::domain::PropertyValue::Number(1e-8),
                shared::domain::PropertyValue::String("HiScroll".to_string()),
            ]
        };
        for item in [
            crate::fake_inventory::catalogue_item("ci-turbo-2", "TP-200", &turbo, values()),
            crate::fake_inventory::catalogue_item("ci-valves-1", "TP-100", &valves, values()),
        ] {
            store.catalogue_items.insert(item.id.to_string(), item);
        }
    }
    let placement = CatalogueItemPlacement::new(&fake);

    let report = move_nodes(
        &placement,
        &[CatalogueItemId::new("ci-turbo-1"), CatalogueItemId::new("ci-turbo-2")],
        Some(&CatalogueCategoryId::new("cat-valves")),
    )
    .await
    .expect("batch");

    assert!(report.is_complete());
    assert_eq!(report.renamed(), 1);
    assert_eq!(succeeded_name(&report.outcomes[0]), "TP-100_copy_1");
    assert_eq!(succeeded_name(&report.outcomes[1]), "TP-200");

    let store = fake.store.lock().await;
    assert_eq!(store.catalogue_items["ci-turbo-1"].name, "TP-100_copy_1");
    assert_eq!(store.catalogue_items["ci-turbo-2"].name, "TP-200");
    assert_eq!(store.catalogue_items["ci-valves-1"].name, "TP-100");
    assert!(store.conflicts.is_empty());
}

#[tokio::test]
async fn catalogue_item_copy_in_own_category_is_suffixed() {
    let fake = FakeInventory::seeded().await;
    let placement = CatalogueItemPlacement::new(&fake);

    let report = copy_nodes(
        &placement,
        &[CatalogueItemId::new("ci-turbo-1")],
        Some(&CatalogueCategoryId::new("cat-turbo")),
    )
    .await
    .expect("batch");

    assert_eq!(succeeded_name(&report.outcomes[0]), "TP-100_copy_1");
    assert_eq!(fake.writes().await, ["POST catalogue item TP-100_copy_1"]);
}

#[tokio::test]
async fn systems_cannot_move_under_their_children() {
    let fake = FakeInventory::seeded().await;
    let tree = SystemTree::new(&fake);

    let report = move_nodes(
        &tree,
        &[SystemId::new("sys-beamline"), SystemId::new("sys-storage")],
        Some(&SystemId::new("sys-optics")),
    )
    .await
    .expect("batch");

    assert_eq!(
        failure_message(&report.outcomes[0]),
        Rejection::IntoDescendant.to_string()
    );
    assert!(report.outcomes[1].is_success());
    let storage = fake.store.lock().await.systems["sys-storage"].clone();
    assert_eq!(storage.parent_id, Some(SystemId::new("sys-optics")));
}

#[tokio::test]
async fn system_copy_to_top_level_keeps_unique_names() {
    let fake = FakeInventory::seeded().await;
    let tree = SystemTree::new(&fake);

    let report = copy_nodes(
        &tree,
        &[SystemId::new("sys-storage"), SystemId::new("sys-optics")],
        None,
    )
    .await
    .expect("batch");

    let names: Vec<_> = report.outcomes.iter().map(succeeded_name).collect();
    assert_eq!(names, ["Storage_copy_1", "Optics"]);
    assert_eq!(report.renamed(), 1);
}

#[tokio::test]
async fn save_as_suggests_and_validates_names() {
    let fake = FakeInventory::seeded().await;
    let tree = CatalogueCategoryTree::new(&fake);
    let pumps = CatalogueCategoryId::new("cat-pumps");

    assert_eq!(
        suggest_save_as_name(&tree, &pumps).await.expect("suggest"),
        "Pumps_copy_1"
    );

    let blank = save_as(&tree, &pumps, "   ").await;
    assert!(matches!(
        blank,
        Err(NodeError::Rejected(Rejection::InvalidName(_)))
    ));

    let taken = save_as(&tree, &pumps, "Valves").await;
    assert!(matches!(
        taken,
        Err(NodeError::Rejected(Rejection::NameTaken(name))) if name == "Valves"
    ));

    let created = save_as(&tree, &pumps, " Roughing pumps ").await.expect("save as");
    assert_eq!(created.name, "Roughing pumps");
    assert_eq!(created.parent_id, Some(CatalogueCategoryId::new("cat-vacuum")));
    assert!(!created.is_leaf);
}

#[tokio::test]
async fn items_move_to_system_with_per_item_outcomes() {
    let fake = FakeInventory::seeded().await;
    let storage = SystemId::new("sys-storage");

    let report = move_items_to_system(
        &fake,
        &[
            ItemId::new("item-1"),
            ItemId::new("item-2"),
            ItemId::new("item-404"),
        ],
        &storage,
    )
    .await
    .expect("batch");

    assert!(report.outcomes[0].is_success());
    assert_eq!(report.outcomes[0].source_name.as_deref(), Some("SN-001"));
    assert!(matches!(
        report.outcomes[1].status,
        OutcomeStatus::Skipped { .. }
    ));
    assert_eq!(
        failure_message(&report.outcomes[2]),
        "The item could not be found. It may have been deleted."
    );
    assert_eq!(fake.store.lock().await.items["item-1"].system_id, storage);
    assert_eq!(
        report.summary(),
        "Moved 1 of 3 item(s) (1 skipped, 1 failed)"
    );

    let missing = move_items_to_system(&fake, &[ItemId::new("item-1")], &SystemId::new("sys-x")).await;
    assert!(missing.expect_err("no such system").is_not_found());
}
