use bson::doc;
use kartoteka::api::{DbApi, Found, Insert};
use kartoteka::errors::DbError;
use kartoteka::query::{Filter, UpdateDoc, parse_filter_json, parse_projection_json, parse_update_json};
use tempfile::tempdir;

const COL: &str = "mycollection";

fn connected() -> DbApi {
    let api = DbApi::open("mem://", "NoName").unwrap();
    api.ensure_unique(COL, "id").unwrap();
    api
}

fn rec(id: &str, nazwa: &str) -> bson::Document {
    doc! { "id": id, "nazwa": nazwa, "opis": "o", "kategoria": "k" }
}

fn ids(found: Option<Found>) -> Vec<String> {
    found
        .map(Found::into_vec)
        .unwrap_or_default()
        .iter()
        .map(|d| d.get_str("id").unwrap().to_string())
        .collect()
}

#[test]
fn insert_then_find_by_id() {
    let api = connected();
    api.insert(COL, Insert::One(rec("1", "a"))).unwrap();
    let found = api.find(COL, Some(&Filter::eq("id", "1")), true, None).unwrap().unwrap();
    assert!(matches!(found, Found::One(_)));
    let doc = found.first().unwrap();
    assert_eq!(doc.get_str("nazwa").unwrap(), "a");
    assert!(doc.get_str("_id").is_ok());
}

#[test]
fn duplicate_id_is_rejected_and_store_unchanged() {
    let api = connected();
    api.insert(COL, Insert::One(rec("1", "a"))).unwrap();
    let err = api.insert(COL, Insert::One(rec("1", "b"))).unwrap_err();
    assert!(matches!(err, DbError::DuplicateKey { ref field, .. } if field == "id"));
    let all = api.find(COL, None, false, None).unwrap().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all.first().unwrap().get_str("nazwa").unwrap(), "a");
}

#[test]
fn batch_insert_is_all_or_nothing() {
    let api = connected();
    api.insert(COL, Insert::One(rec("1", "a"))).unwrap();
    let err = api.insert(COL, Insert::Many(vec![rec("2", "b"), rec("1", "c")])).unwrap_err();
    assert!(matches!(err, DbError::DuplicateKey { .. }));
    assert_eq!(ids(api.find(COL, None, false, None).unwrap()), vec!["1"]);

    let report = api.insert(COL, Insert::Many(vec![rec("2", "b"), rec("3", "c")])).unwrap();
    assert_eq!(report.inserted_ids.len(), 2);
}

#[test]
fn insert_payload_must_be_one_or_many() {
    assert!(Insert::from_parts(Some(rec("1", "a")), Some(vec![rec("2", "b")])).is_err());
    assert!(Insert::from_parts(None, None).is_err());
    assert!(Insert::from_parts(None, Some(vec![])).is_err());
    assert_eq!(Insert::from_parts(Some(rec("1", "a")), None).unwrap(), Insert::One(rec("1", "a")));
}

#[test]
fn deleting_missing_id_is_a_noop() {
    let api = connected();
    api.insert(COL, Insert::One(rec("1", "a"))).unwrap();
    assert_eq!(api.delete(COL, &Filter::eq("id", "nope"), false).unwrap().deleted, 0);
    assert_eq!(api.delete("never_created", &Filter::True, true).unwrap().deleted, 0);
    assert_eq!(api.delete(COL, &Filter::eq("id", "1"), false).unwrap().deleted, 1);
    assert!(api.find(COL, None, false, None).unwrap().is_none());
}

#[test]
fn delete_many_removes_every_match() {
    let api = connected();
    let mut batch = vec![rec("1", "x"), rec("2", "x"), rec("3", "y")];
    batch[2].insert("kategoria", "other");
    api.insert(COL, Insert::Many(batch)).unwrap();
    let filter = parse_filter_json(r#"{"kategoria":"k"}"#).unwrap();
    assert_eq!(api.delete(COL, &filter, false).unwrap().deleted, 1);
    api.insert(COL, Insert::One(rec("1", "x"))).unwrap();
    assert_eq!(api.delete(COL, &filter, true).unwrap().deleted, 2);
    assert_eq!(ids(api.find(COL, None, false, None).unwrap()), vec!["3"]);
}

#[test]
fn update_missing_id_fails_without_upsert_and_creates_with_it() {
    let api = connected();
    let changes = UpdateDoc::set(doc! { "nazwa": "n", "opis": "o", "kategoria": "k" });
    let filter = Filter::eq("id", "42");
    let err = api.update(COL, &filter, &changes, false, false).unwrap_err();
    assert!(matches!(err, DbError::NotFound(_)));
    assert!(api.find(COL, Some(&filter), true, None).unwrap().is_none());

    let report = api.update(COL, &filter, &changes, false, true).unwrap();
    assert!(report.upserted_id.is_some());
    let created = api.find(COL, Some(&filter), true, None).unwrap().unwrap();
    assert_eq!(created.first().unwrap().get_str("nazwa").unwrap(), "n");
}

#[test]
fn update_changes_existing_record() {
    let api = connected();
    api.insert(COL, Insert::One(rec("1", "a"))).unwrap();
    let upd = parse_update_json(r#"{"$set":{"nazwa":"b"},"$unset":["opis"]}"#).unwrap();
    let report = api.update(COL, &Filter::eq("id", "1"), &upd, false, false).unwrap();
    assert_eq!((report.matched, report.modified), (1, 1));
    let found = api.find(COL, Some(&Filter::eq("id", "1")), true, None).unwrap().unwrap();
    let doc = found.first().unwrap();
    assert_eq!(doc.get_str("nazwa").unwrap(), "b");
    assert!(doc.get("opis").is_none());

    let again = api.update(COL, &Filter::eq("id", "1"), &upd, false, false).unwrap();
    assert_eq!((again.matched, again.modified), (1, 0));
}

#[test]
fn inc_overflow_is_an_error_and_keeps_the_record() {
    let api = connected();
    api.insert(COL, Insert::One(doc! { "id": "1", "n": i64::MAX })).unwrap();
    let upd = parse_update_json(r#"{"$inc":{"n":1}}"#).unwrap();
    let err = api.update(COL, &Filter::eq("id", "1"), &upd, false, false).unwrap_err();
    assert!(matches!(err, DbError::QueryError(_)));
    let found = api.find(COL, Some(&Filter::eq("id", "1")), true, None).unwrap().unwrap();
    assert_eq!(found.first().unwrap().get_i64("n").unwrap(), i64::MAX);
}

#[test]
fn inc_rejects_text_fields_and_keeps_int32() {
    let api = connected();
    api.insert(COL, Insert::One(doc! { "id": "1", "nazwa": "mlotek", "n": 1 })).unwrap();
    let by_id = Filter::eq("id", "1");
    let on_text = parse_update_json(r#"{"$inc":{"nazwa":5}}"#).unwrap();
    let err = api.update(COL, &by_id, &on_text, false, false).unwrap_err();
    assert!(matches!(err, DbError::QueryError(_)));

    let on_number = parse_update_json(r#"{"$inc":{"n":1}}"#).unwrap();
    api.update(COL, &by_id, &on_number, false, false).unwrap();
    let found = api.find(COL, Some(&by_id), true, None).unwrap().unwrap();
    let doc = found.first().unwrap();
    assert_eq!(doc.get_str("nazwa").unwrap(), "mlotek");
    assert_eq!(doc.get("n"), Some(&bson::Bson::Int32(2)));
}

#[test]
fn update_cannot_take_an_existing_id() {
    let api = connected();
    api.insert(COL, Insert::Many(vec![rec("1", "a"), rec("2", "b")])).unwrap();
    let err = api
        .update(COL, &Filter::eq("id", "2"), &UpdateDoc::set(doc! { "id": "1" }), false, false)
        .unwrap_err();
    assert!(matches!(err, DbError::DuplicateKey { .. }));
    assert_eq!(ids(api.find(COL, None, false, None).unwrap()), vec!["1", "2"]);
}

#[test]
fn empty_update_is_invalid() {
    let api = connected();
    api.insert(COL, Insert::One(rec("1", "a"))).unwrap();
    let err = api.update(COL, &Filter::eq("id", "1"), &UpdateDoc::set(doc! {}), false, false).unwrap_err();
    assert!(matches!(err, DbError::InvalidArgument(_)));
}

#[test]
fn find_all_preserves_insertion_order() {
    let api = connected();
    for id in ["c", "a", "b"] {
        api.insert(COL, Insert::One(rec(id, id))).unwrap();
    }
    assert_eq!(ids(api.find(COL, None, false, None).unwrap()), vec!["c", "a", "b"]);
    assert_eq!(ids(api.find(COL, Some(&Filter::True), false, None).unwrap()), vec!["c", "a", "b"]);
}

#[test]
fn find_on_unknown_collection_is_none_and_does_not_create_it() {
    let api = connected();
    assert!(api.find("ghost", None, false, None).unwrap().is_none());
    assert_eq!(api.list_collections().unwrap(), vec![COL.to_string()]);
}

#[test]
fn projection_limits_fields() {
    let api = connected();
    api.insert(COL, Insert::One(rec("1", "a"))).unwrap();
    let proj = parse_projection_json(r#"{"nazwa":1,"_id":0}"#).unwrap();
    let found = api.find(COL, None, true, Some(&proj)).unwrap().unwrap();
    assert_eq!(found.first().unwrap(), &doc! { "nazwa": "a" });
}

#[test]
fn projection_reaches_into_embedded_documents() {
    let api = connected();
    api.insert(COL, Insert::One(doc! { "id": "1", "meta": { "a": 1, "b": 2 } })).unwrap();
    let proj = parse_projection_json(r#"{"meta.a":1,"_id":0}"#).unwrap();
    let found = api.find(COL, None, true, Some(&proj)).unwrap().unwrap();
    assert_eq!(found.first().unwrap(), &doc! { "meta": { "a": 1 } });
}

#[test]
fn operations_after_disconnect_report_not_connected() {
    let api = connected();
    api.insert(COL, Insert::One(rec("1", "a"))).unwrap();
    api.disconnect().unwrap();
    assert!(!api.is_connected());
    assert!(api.disconnect().is_ok());

    assert!(matches!(api.insert(COL, Insert::One(rec("2", "b"))), Err(DbError::NotConnected)));
    assert!(matches!(api.find(COL, None, false, None), Err(DbError::NotConnected)));
    assert!(matches!(api.delete(COL, &Filter::True, true), Err(DbError::NotConnected)));
    assert!(matches!(
        api.update(COL, &Filter::True, &UpdateDoc::set(doc! {"a": 1}), false, true),
        Err(DbError::NotConnected)
    ));
    assert!(matches!(api.list_collections(), Err(DbError::NotConnected)));
    assert!(DbError::NotConnected.is_connection_error());
}

#[test]
fn memory_store_is_fresh_after_reconnect() {
    let api = connected();
    api.insert(COL, Insert::One(rec("1", "a"))).unwrap();
    api.disconnect().unwrap();
    api.connect().unwrap();
    assert!(api.find(COL, None, false, None).unwrap().is_none());
}

#[test]
fn unsupported_uri_fails_to_connect() {
    let err = DbApi::open("mongodb://localhost:27017/", "NoName").unwrap_err();
    assert!(matches!(err, DbError::UnsupportedUri(_)));
    let api = DbApi::new("bogus", "NoName");
    assert!(api.connect().is_err());
    assert!(!api.is_connected());
}

#[test]
fn file_store_survives_reopen() {
    let dir = tempdir().unwrap();
    let uri = format!("file://{}", dir.path().display());
    {
        let api = DbApi::open(uri.as_str(), "NoName").unwrap();
        api.ensure_unique(COL, "id").unwrap();
        api.insert(COL, Insert::Many(vec![rec("2", "b"), rec("1", "a")])).unwrap();
        api.update(COL, &Filter::eq("id", "1"), &UpdateDoc::set(doc! { "nazwa": "z" }), false, false)
            .unwrap();
        api.disconnect().unwrap();
    }
    assert!(dir.path().join("NoName.ktk").exists());

    let api = DbApi::open(uri.as_str(), "NoName").unwrap();
    let docs = api.find(COL, None, false, None).unwrap().unwrap().into_vec();
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].get_str("id").unwrap(), "2");
    assert_eq!(docs[1].get_str("nazwa").unwrap(), "z");
    assert!(api.insert(COL, Insert::One(rec("2", "again"))).is_err());
}

#[test]
fn corrupt_snapshot_fails_connect() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("NoName.ktk"), b"KTK1garbage").unwrap();
    let api = DbApi::new(format!("file://{}", dir.path().display()), "NoName");
    assert!(api.connect().is_err());
    assert!(!api.is_connected());
}
