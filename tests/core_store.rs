use avatar_catalog::{
    avatar::{AvatarPatch, AvatarRecord},
    core::store::{CatalogDocument, CatalogStore, StoreError},
};

fn rec(id: &str, name: &str) -> AvatarRecord {
    AvatarRecord::new(id, name)
}

fn ids(store: &CatalogStore) -> Vec<String> {
    store.ordered_ids().to_vec()
}

#[test]
fn add_keeps_insertion_order_and_rejects_duplicates() {
    let mut store = CatalogStore::new();
    store.add(rec("avtr_b", "B")).expect("add b");
    store.add(rec("avtr_a", "A")).expect("add a");

    let err = store.add(rec("avtr_b", "B again")).expect_err("duplicate");
    assert_eq!(err, StoreError::AlreadyExists("avtr_b".to_string()));

    assert_eq!(ids(&store), ["avtr_b", "avtr_a"]);
    assert_eq!(store.get("avtr_b").map(|r| r.name.as_str()), Some("B"));
}

#[test]
fn update_returns_previous_and_leaves_identity_alone() {
    let mut store = CatalogStore::new();
    store.add(rec("avtr_1", "Old")).expect("add");

    let prev = store
        .update(
            "avtr_1",
            &AvatarPatch {
                name: Some("New".to_string()),
                ..AvatarPatch::default()
            },
        )
        .expect("update");

    assert_eq!(prev.name, "Old");
    let now = store.get("avtr_1").expect("present");
    assert_eq!(now.id, "avtr_1");
    assert_eq!(now.name, "New");

    let missing = store.update("avtr_2", &AvatarPatch::default());
    assert_eq!(missing, Err(StoreError::MissingAvatar("avtr_2".to_string())));
}

#[test]
fn delete_many_removes_present_ids_and_ignores_the_rest() {
    let mut store = CatalogStore::new();
    for id in ["avtr_1", "avtr_2", "avtr_3", "avtr_4"] {
        store.add(rec(id, id)).expect("add");
    }

    let doomed = vec![
        "avtr_3".to_string(),
        "avtr_9".to_string(),
        "avtr_1".to_string(),
    ];
    let removed = store.delete_many(&doomed);

    let removed_ids: Vec<_> = removed.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(removed_ids, ["avtr_1", "avtr_3"]);
    assert_eq!(ids(&store), ["avtr_2", "avtr_4"]);
    assert!(store.delete_many(&Vec::<String>::new()).is_empty());
}

#[test]
fn delete_single_reports_missing() {
    let mut store = CatalogStore::new();
    store.add(rec("avtr_1", "One")).expect("add");
    assert_eq!(store.delete("avtr_1").expect("delete").name, "One");
    assert!(store.is_empty());
    assert_eq!(
        store.delete("avtr_1"),
        Err(StoreError::MissingAvatar("avtr_1".to_string()))
    );
}

#[test]
fn replace_all_is_atomic_on_duplicate_input() {
    let mut store = CatalogStore::new();
    store.add(rec("avtr_keep", "Keep")).expect("add");

    let err = store
        .replace_all(vec![rec("avtr_x", "X"), rec("avtr_x", "X2")])
        .expect_err("duplicate ids");
    assert_eq!(err, StoreError::AlreadyExists("avtr_x".to_string()));
    assert_eq!(ids(&store), ["avtr_keep"]);

    store
        .replace_all(vec![rec("avtr_y", "Y"), rec("avtr_z", "Z")])
        .expect("replace");
    assert_eq!(ids(&store), ["avtr_y", "avtr_z"]);
}

#[test]
fn document_round_trip_preserves_order() {
    let mut store = CatalogStore::new();
    store.add(rec("avtr_2", "Two")).expect("add");
    store.add(rec("avtr_1", "One")).expect("add");

    let doc = store.export_document();
    assert_eq!(doc.format_version, 1);

    let restored = CatalogStore::from_document(doc.clone()).expect("restore");
    assert_eq!(restored.export_document(), doc);

    let bad = CatalogDocument::new(vec![rec("avtr_1", "a"), rec("avtr_1", "b")]);
    assert!(CatalogStore::from_document(bad).is_err());
}
