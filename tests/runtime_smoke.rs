use std::time::Duration;

use avatar_catalog::{
    avatar::{AvatarPatch, AvatarRecord},
    config::RuntimeConfig,
    core::store::{CatalogStore, StoreError},
    ordering::SortMode,
    persist::{DocumentSink, memory::MemoryDocumentSink},
    runtime::{
        events::CatalogEvent,
        handle::{RuntimeError, open_catalog, spawn_catalog},
    },
};

async fn next_event(sub: &mut tokio::sync::broadcast::Receiver<CatalogEvent>) -> CatalogEvent {
    tokio::time::timeout(Duration::from_secs(1), sub.recv())
        .await
        .expect("event")
        .expect("recv")
}

#[tokio::test]
async fn mutations_emit_events_in_order_with_durability_markers() {
    let sink = MemoryDocumentSink::new();
    let handle = spawn_catalog(
        CatalogStore::new(),
        Some(Box::new(sink.clone())),
        RuntimeConfig::default(),
    );
    let mut sub = handle.subscribe();

    handle.add(AvatarRecord::new("avtr_1", "One")).await.expect("add");
    handle
        .update(
            "avtr_1",
            AvatarPatch {
                name: Some("Uno".to_string()),
                ..AvatarPatch::default()
            },
        )
        .await
        .expect("update");
    handle.delete("avtr_1").await.expect("delete");

    let expected = [
        CatalogEvent::Added { id: "avtr_1".to_string() },
        CatalogEvent::Persisted { revision: 1 },
        CatalogEvent::Updated { id: "avtr_1".to_string() },
        CatalogEvent::Persisted { revision: 2 },
        CatalogEvent::Deleted { id: "avtr_1".to_string() },
        CatalogEvent::Persisted { revision: 3 },
    ];
    for want in expected {
        assert_eq!(next_event(&mut sub).await, want);
    }

    assert_eq!(sink.save_count(), 3);
    assert_eq!(handle.revision().await.expect("revision"), 3);
    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn failed_save_rolls_back_and_reports() {
    let sink = MemoryDocumentSink::new();
    let handle = spawn_catalog(
        CatalogStore::new(),
        Some(Box::new(sink.clone())),
        RuntimeConfig::default(),
    );
    handle.add(AvatarRecord::new("avtr_1", "One")).await.expect("add");

    sink.set_fail_saves(true);
    let err = handle
        .add(AvatarRecord::new("avtr_2", "Two"))
        .await
        .expect_err("save must fail");
    assert!(matches!(err, RuntimeError::Persist(_)));
    assert!(!handle.contains("avtr_2").await.expect("contains"));
    assert_eq!(handle.len().await.expect("len"), 1);

    sink.set_fail_saves(false);
    handle.add(AvatarRecord::new("avtr_2", "Two")).await.expect("retry");

    let stored = sink.load().expect("load").expect("document");
    assert_eq!(stored.avatars.len(), 2);
    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn store_errors_surface_unchanged() {
    let handle = spawn_catalog(CatalogStore::new(), None, RuntimeConfig::default());
    handle.add(AvatarRecord::new("avtr_1", "One")).await.expect("add");

    let dup = handle.add(AvatarRecord::new("avtr_1", "Again")).await;
    assert!(matches!(
        dup,
        Err(RuntimeError::Store(StoreError::AlreadyExists(ref id))) if id == "avtr_1"
    ));
    let missing = handle.delete("avtr_9").await;
    assert!(matches!(
        missing,
        Err(RuntimeError::Store(StoreError::MissingAvatar(_)))
    ));
    handle.shutdown().await.expect("shutdown");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writers_never_lose_updates() {
    let sink = MemoryDocumentSink::new();
    let handle = open_catalog(Box::new(sink.clone()), RuntimeConfig::default())
        .await
        .expect("open");

    let mut tasks = Vec::new();
    for w in 0..8u32 {
        let h = handle.clone();
        tasks.push(tokio::spawn(async move {
            for i in 0..25u32 {
                h.add(AvatarRecord::new(format!("avtr_{w:x}{i:02x}"), "x"))
                    .await
                    .expect("add");
            }
        }));
    }
    for t in tasks {
        t.await.expect("join");
    }

    assert_eq!(handle.len().await.expect("len"), 200);
    let stored = sink.load().expect("load").expect("document");
    assert_eq!(stored.avatars.len(), 200);
    assert_eq!(sink.save_count(), 200);
    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn queries_sort_filter_and_export() {
    let mut fox = AvatarRecord::new("avtr_1", "Red Fox");
    fox.author_name = "Ann".to_string();
    let mut owl = AvatarRecord::new("avtr_2", "Owl");
    owl.author_name = "Foxworth".to_string();
    let handle = spawn_catalog(CatalogStore::new(), None, RuntimeConfig::default());
    handle
        .replace_all(vec![fox, owl, AvatarRecord::new("avtr_3", "Cat")])
        .await
        .expect("replace");

    let hits = handle.search("FOX", SortMode::Oldest).await.expect("search");
    let ids: Vec<_> = hits.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["avtr_1", "avtr_2"]);
    assert_eq!(handle.sorted(SortMode::Newest).await.expect("sorted").len(), 3);

    let csv = handle.to_csv().await.expect("csv");
    assert!(csv.starts_with("ID,Name,Author Name\navtr_1,Red Fox,Ann"));
    let txt = handle.to_text().await.expect("txt");
    assert_eq!(txt.lines().count(), 3);

    let removed = handle
        .delete_many(vec!["avtr_3".to_string(), "avtr_9".to_string()])
        .await
        .expect("delete many");
    assert_eq!(removed.len(), 1);
    handle.shutdown().await.expect("shutdown");
    assert!(matches!(handle.len().await, Err(RuntimeError::ChannelClosed)));
}
