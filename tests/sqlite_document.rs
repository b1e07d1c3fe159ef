use tempfile::TempDir;

use avatar_catalog::{
    avatar::AvatarRecord,
    config::RuntimeConfig,
    core::store::{CatalogDocument, CatalogStore},
    persist::{DocumentSink, PersistError, memory::MemoryDocumentSink, sqlite::SqliteDocumentSink},
    runtime::handle::open_catalog,
};

fn doc(ids: &[&str]) -> CatalogDocument {
    CatalogDocument::new(ids.iter().map(|id| AvatarRecord::new(*id, *id)).collect())
}

#[test]
fn empty_database_loads_nothing() {
    let sink = SqliteDocumentSink::open_in_memory().expect("open");
    assert!(sink.load().expect("load").is_none());
    assert_eq!(sink.revision().expect("revision"), 0);
}

#[test]
fn save_replaces_the_whole_document_and_survives_reopen() {
    let tmp = TempDir::new().expect("tmp");
    let path = tmp.path().join("catalog.db");

    {
        let mut sink = SqliteDocumentSink::open(&path).expect("open");
        sink.save(&doc(&["avtr_1", "avtr_2"])).expect("save 1");
        sink.save(&doc(&["avtr_3"])).expect("save 2");
        assert_eq!(sink.revision().expect("revision"), 2);
    }

    let sink = SqliteDocumentSink::open(&path).expect("reopen");
    let loaded = sink.load().expect("load").expect("document");
    assert_eq!(loaded, doc(&["avtr_3"]));
}

#[test]
fn bare_array_payload_is_still_readable() {
    let mut sink = SqliteDocumentSink::open_in_memory().expect("open");
    let legacy = br#"[
        {"id":"avtr_a","name":"Fox","authorName":"A","thumbnailImageUrl":"t",
         "created_at":"not a date",
         "unityPackages":[
            {"platform":"android","variant":"security","performanceRating":"Good"}
         ]},
        {"id":"avtr_b","name":"Owl"}
    ]"#;
    sink.put_raw(legacy).expect("raw write");

    let loaded = sink.load().expect("load").expect("document");
    assert_eq!(loaded.format_version, 1);
    assert_eq!(loaded.avatars.len(), 2);
    assert_eq!(loaded.avatars[0].author_name, "A");
    assert!(loaded.avatars[0].created_at.is_none());
    assert_eq!(loaded.avatars[1].name, "Owl");
}

#[test]
fn unknown_format_version_is_rejected() {
    let mut sink = SqliteDocumentSink::open_in_memory().expect("open");
    sink.put_raw(br#"{"format_version":9,"avatars":[]}"#).expect("raw write");
    match sink.load() {
        Err(PersistError::UnsupportedFormat(9)) => {}
        other => panic!("expected unsupported format, got {other:?}"),
    }
}

#[tokio::test]
async fn runtime_writes_reach_sqlite_and_reload() {
    let tmp = TempDir::new().expect("tmp");
    let path = tmp.path().join("catalog.db");

    let sink = SqliteDocumentSink::open(&path).expect("open");
    let catalog = open_catalog(Box::new(sink), RuntimeConfig::default())
        .await
        .expect("open catalog");
    catalog.add(AvatarRecord::new("avtr_1", "One")).await.expect("add 1");
    catalog.add(AvatarRecord::new("avtr_2", "Two")).await.expect("add 2");
    catalog.delete("avtr_1").await.expect("delete");
    catalog.shutdown().await.expect("shutdown");

    let reopened = SqliteDocumentSink::open(&path).expect("reopen");
    assert_eq!(reopened.revision().expect("revision"), 3);
    let catalog = open_catalog(Box::new(reopened), RuntimeConfig::default())
        .await
        .expect("reload");
    let ids: Vec<_> = catalog
        .get_all()
        .await
        .expect("get all")
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, ["avtr_2"]);
    catalog.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn duplicate_ids_in_stored_document_fail_the_load() {
    let payload = serde_json::to_vec(&doc(&["avtr_1", "avtr_1"])).expect("encode");
    let sink = MemoryDocumentSink::with_payload(payload);
    let res = open_catalog(Box::new(sink), RuntimeConfig::default()).await;
    assert!(res.is_err());

    let payload = serde_json::to_vec(&doc(&["avtr_1"])).expect("encode");
    let ok = MemoryDocumentSink::with_payload(payload);
    let loaded = ok.load().expect("load").expect("doc");
    assert_eq!(CatalogStore::from_document(loaded).expect("store").len(), 1);
}
