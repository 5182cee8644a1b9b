use bson::doc;
use kartoteka::engine::{Engine, EngineOptions};
use kartoteka::snapshot::{SNAPSHOT_MAGIC, read_snapshot};
use tempfile::tempdir;

#[test]
fn collections_are_listed_in_creation_order() {
    let engine = Engine::in_memory();
    engine.get_or_create("b");
    engine.get_or_create("a");
    engine.get_or_create("b");
    assert_eq!(engine.list_collection_names(), vec!["b", "a"]);
    assert!(engine.drop_collection("b"));
    assert!(!engine.drop_collection("b"));
    assert_eq!(engine.list_collection_names(), vec!["a"]);
    assert!(engine.collection("b").is_none());
}

#[test]
fn in_memory_flush_is_a_noop() {
    let engine = Engine::in_memory();
    engine.get_or_create("a").insert_one(doc! { "x": 1 }).unwrap();
    engine.flush().unwrap();
    assert!(engine.options().snapshot_path.is_none());
}

#[test]
fn snapshot_round_trip_keeps_ids_keys_and_order() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("db.ktk");
    let ids = {
        let engine = Engine::open(EngineOptions::persistent(&path)).unwrap();
        let col = engine.get_or_create("items");
        col.create_unique_key("id").unwrap();
        let ids = col.insert_many(vec![doc! { "id": "b" }, doc! { "id": "a" }]).unwrap();
        engine.get_or_create("empty");
        engine.flush().unwrap();
        ids
    };

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[..4], &SNAPSHOT_MAGIC);
    let image = read_snapshot(&path).unwrap();
    assert_eq!(image.collections.len(), 2);

    let engine = Engine::open(EngineOptions::persistent(&path)).unwrap();
    assert_eq!(engine.list_collection_names(), vec!["items", "empty"]);
    let col = engine.collection("items").unwrap();
    assert_eq!(col.unique_keys(), vec!["id".to_string()]);
    let docs = col.documents();
    assert_eq!(docs.iter().map(|d| d.id.clone()).collect::<Vec<_>>(), ids);
    assert_eq!(docs[0].data.0.get_str("id").unwrap(), "b");
}

#[test]
fn open_without_snapshot_starts_empty() {
    let dir = tempdir().unwrap();
    let engine = Engine::open(EngineOptions::persistent(dir.path().join("none.ktk"))).unwrap();
    assert!(engine.list_collection_names().is_empty());
}

#[test]
fn truncated_snapshot_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("db.ktk");
    {
        let engine = Engine::open(EngineOptions::persistent(&path)).unwrap();
        engine.get_or_create("a").insert_one(doc! { "x": 1 }).unwrap();
        engine.flush().unwrap();
    }
    let bytes = std::fs::read(&path).unwrap();
    std::fs::write(&path, &bytes[..bytes.len() - 3]).unwrap();
    assert!(Engine::open(EngineOptions::persistent(&path)).is_err());
}
