use bson::doc;
use kartoteka::collection::Collection;
use kartoteka::errors::DbError;
use kartoteka::query::{Filter, UpdateDoc, parse_filter, parse_update};

fn seeded() -> Collection {
    let col = Collection::new("items");
    col.create_unique_key("id").unwrap();
    col.insert_many(vec![
        doc! { "id": "1", "n": 1, "tag": "a" },
        doc! { "id": "2", "n": 5, "tag": "b" },
        doc! { "id": "3", "n": 9, "tag": "a" },
    ])
    .unwrap();
    col
}

fn hits(col: &Collection, filter: &Filter) -> usize {
    col.find(filter, None, None).len()
}

#[test]
fn unique_key_is_sparse() {
    let col = seeded();
    col.insert_one(doc! { "other": 1 }).unwrap();
    col.insert_one(doc! { "other": 2 }).unwrap();
    assert_eq!(col.len(), 5);
}

#[test]
fn unique_key_creation_fails_on_existing_clash() {
    let col = Collection::new("c");
    col.insert_many(vec![doc! { "k": 1 }, doc! { "k": 1 }]).unwrap();
    assert!(matches!(col.create_unique_key("k"), Err(DbError::DuplicateKey { .. })));
    assert!(col.unique_keys().is_empty());
}

#[test]
fn duplicates_inside_a_batch_reject_the_batch() {
    let col = seeded();
    let err = col.insert_many(vec![doc! { "id": "9" }, doc! { "id": "9" }]).unwrap_err();
    assert!(matches!(err, DbError::DuplicateKey { .. }));
    assert_eq!(col.len(), 3);
    assert!(col.insert_many(vec![]).is_err());
}

#[test]
fn caller_supplied_id_is_kept_and_checked() {
    let col = Collection::new("c");
    let id = "67e55044-10b1-426f-9247-bb680e5fe0c8";
    let got = col.insert_one(doc! { "_id": id, "x": 1 }).unwrap();
    assert_eq!(got.to_string(), id);
    assert!(col.insert_one(doc! { "_id": id }).is_err());
    assert!(matches!(col.insert_one(doc! { "_id": 7 }), Err(DbError::InvalidArgument(_))));
    let found = col.find_one(&Filter::eq("_id", id), None).unwrap();
    assert_eq!(found.get_i32("x").unwrap(), 1);
}

#[test]
fn find_with_ranges_and_limit() {
    let col = seeded();
    let f = parse_filter(&doc! { "n": { "$gte": 5 } }).unwrap();
    assert_eq!(hits(&col, &f), 2);
    let first = col.find(&f, None, Some(1));
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].get_str("id").unwrap(), "2");
    let or = parse_filter(&doc! { "$or": [ { "id": "1" }, { "tag": "b" } ] }).unwrap();
    assert_eq!(hits(&col, &or), 2);
    let inn = parse_filter(&doc! { "id": { "$in": ["1", "3", "x"] } }).unwrap();
    assert_eq!(hits(&col, &inn), 2);
}

#[test]
fn update_many_and_inc() {
    let col = seeded();
    let f = parse_filter(&doc! { "tag": "a" }).unwrap();
    let upd = parse_update(&doc! { "$inc": { "n": 10 } }).unwrap();
    let report = col.update(&f, &upd, true, false).unwrap();
    assert_eq!((report.matched, report.modified), (2, 2));
    let ns: Vec<i32> = col.find(&f, None, None).iter().map(|d| d.get_i32("n").unwrap()).collect();
    assert_eq!(ns, vec![11, 19]);
}

#[test]
fn update_without_match_is_empty_report() {
    let col = seeded();
    let report = col.update(&Filter::eq("id", "x"), &UpdateDoc::set(doc! { "n": 0 }), false, false).unwrap();
    assert_eq!(report.matched, 0);
    assert!(report.upserted_id.is_none());
}

#[test]
fn upsert_respects_unique_key() {
    let col = seeded();
    let err = col
        .update(&Filter::eq("tag", "zzz"), &UpdateDoc::set(doc! { "id": "1" }), false, true)
        .unwrap_err();
    assert!(matches!(err, DbError::DuplicateKey { .. }));
    assert_eq!(col.len(), 3);
}

#[test]
fn multi_update_clash_leaves_everything_untouched() {
    let col = seeded();
    let f = parse_filter(&doc! { "tag": "a" }).unwrap();
    let err = col.update(&f, &UpdateDoc::set(doc! { "id": "same" }), true, false).unwrap_err();
    assert!(matches!(err, DbError::DuplicateKey { .. }));
    assert_eq!(hits(&col, &Filter::eq("id", "same")), 0);
}

#[test]
fn replace_document_keeps_id() {
    let col = seeded();
    let before = col.find_one(&Filter::eq("id", "2"), None).unwrap();
    let upd = parse_update(&doc! { "id": "2", "fresh": true }).unwrap();
    col.update(&Filter::eq("id", "2"), &upd, false, false).unwrap();
    let after = col.find_one(&Filter::eq("id", "2"), None).unwrap();
    assert_eq!(before.get_str("_id").unwrap(), after.get_str("_id").unwrap());
    assert!(after.get("n").is_none());
    assert!(after.get_bool("fresh").unwrap());
}

#[test]
fn delete_one_vs_many() {
    let col = seeded();
    let f = parse_filter(&doc! { "tag": "a" }).unwrap();
    assert_eq!(col.delete(&f, false).deleted, 1);
    assert_eq!(col.delete(&f, true).deleted, 1);
    assert_eq!(col.delete(&f, true).deleted, 0);
    assert_eq!(col.len(), 1);
}
