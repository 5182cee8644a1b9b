use crate::document::ID_FIELD;
use crate::errors::DbError;
use bson::{Bson, Document as BsonDocument};
use std::cmp::Ordering;

use super::types::{CmpOp, Filter, MAX_PATH_DEPTH, Projection, UpdateDoc};

#[must_use]
pub fn eval_filter(doc: &BsonDocument, filter: &Filter) -> bool {
    match filter {
        Filter::True => true,
        Filter::And(fs) => fs.iter().all(|f| eval_filter(doc, f)),
        Filter::Or(fs) => fs.iter().any(|f| eval_filter(doc, f)),
        Filter::Nor(fs) => !fs.iter().any(|f| eval_filter(doc, f)),
        Filter::Exists { path, exists } => get_path(doc, path).is_some() == *exists,
        Filter::In { path, values } => get_path(doc, path).is_some_and(|v| is_in_set(v, values)),
        Filter::Nin { path, values } => !get_path(doc, path).is_some_and(|v| is_in_set(v, values)),
        Filter::Cmp { path, op: CmpOp::Ne, value } => {
            !get_path(doc, path).is_some_and(|v| values_equal(v, value))
        }
        Filter::Cmp { path, op, value } => get_path(doc, path).is_some_and(|v| match op {
            CmpOp::Eq => values_equal(v, value),
            CmpOp::Gt => comparable(v, value) && compare_bson(v, value) == Ordering::Greater,
            CmpOp::Gte => comparable(v, value) && compare_bson(v, value) != Ordering::Less,
            CmpOp::Lt => comparable(v, value) && compare_bson(v, value) == Ordering::Less,
            CmpOp::Lte => comparable(v, value) && compare_bson(v, value) != Ordering::Greater,
            CmpOp::Ne => unreachable!("handled above"),
        }),
    }
}

fn is_in_set(v: &Bson, set: &[Bson]) -> bool {
    set.iter().any(|x| values_equal(v, x))
}

fn is_num(x: &Bson) -> bool {
    matches!(x, Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_))
}

#[allow(clippy::cast_precision_loss)]
fn as_f64(x: &Bson) -> f64 {
    match x {
        Bson::Int32(i) => f64::from(*i),
        Bson::Int64(i) => *i as f64,
        Bson::Double(f) => *f,
        _ => f64::NAN,
    }
}

/// Equality that treats 1, 1i64 and 1.0 as the same value.
fn values_equal(a: &Bson, b: &Bson) -> bool {
    if is_num(a) && is_num(b) {
        return as_f64(a) == as_f64(b);
    }
    a == b
}

// Range operators only match values of the same kind, as in Mongo.
fn comparable(a: &Bson, b: &Bson) -> bool {
    (is_num(a) && is_num(b)) || type_rank(a) == type_rank(b)
}

pub(crate) fn get_path<'a>(doc: &'a BsonDocument, path: &str) -> Option<&'a Bson> {
    if path.is_empty() || path.len() > 1024 {
        return None;
    }
    let mut cur = doc;
    let mut parts = path.split('.').peekable();
    let mut segs = 0usize;
    while let Some(part) = parts.next() {
        segs += 1;
        if segs > MAX_PATH_DEPTH {
            return None;
        }
        let v = cur.get(part)?;
        if parts.peek().is_none() {
            return Some(v);
        }
        match v {
            Bson::Document(d) => cur = d,
            _ => return None,
        }
    }
    None
}

#[must_use]
pub fn compare_bson(a: &Bson, b: &Bson) -> Ordering {
    if is_num(a) && is_num(b) {
        return as_f64(a).total_cmp(&as_f64(b));
    }
    match (a, b) {
        (Bson::String(x), Bson::String(y)) => x.cmp(y),
        (Bson::Boolean(x), Bson::Boolean(y)) => x.cmp(y),
        (Bson::DateTime(x), Bson::DateTime(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

const fn type_rank(v: &Bson) -> u8 {
    match v {
        Bson::MinKey => 0,
        Bson::Null | Bson::Undefined => 1,
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_) => 2,
        Bson::String(_) | Bson::Symbol(_) => 3,
        Bson::Document(_) => 4,
        Bson::Array(_) => 5,
        Bson::Binary(_) => 6,
        Bson::ObjectId(_) => 7,
        Bson::Boolean(_) => 8,
        Bson::DateTime(_) => 9,
        Bson::Timestamp(_) => 10,
        Bson::RegularExpression(_) => 11,
        Bson::MaxKey => 255,
        _ => 12,
    }
}

/// Apply a projection to a document view (`_id` included). Dotted fields address embedded documents.
#[must_use]
pub fn project(doc: &BsonDocument, projection: &Projection) -> BsonDocument {
    match projection {
        Projection::Include { fields, keep_id } => {
            let mut out = BsonDocument::new();
            if *keep_id && let Some(id) = doc.get(ID_FIELD) {
                out.insert(ID_FIELD, id.clone());
            }
            for f in fields {
                if let Some(v) = get_path(doc, f) {
                    set_path(&mut out, f, v.clone());
                }
            }
            out
        }
        Projection::Exclude(fields) => {
            let mut out = doc.clone();
            for f in fields {
                unset_path(&mut out, f);
            }
            out
        }
    }
}

fn ensure_subdoc<'a>(root: &'a mut BsonDocument, key: &str) -> &'a mut BsonDocument {
    if !matches!(root.get(key), Some(Bson::Document(_))) {
        root.insert(key.to_string(), Bson::Document(BsonDocument::new()));
    }
    match root.get_mut(key) {
        Some(Bson::Document(d)) => d,
        _ => unreachable!("subdocument inserted above"),
    }
}

fn traverse_to_parent<'a>(root: &'a mut BsonDocument, path: &str) -> (&'a mut BsonDocument, String) {
    let mut cur = root;
    let mut iter = path.split('.').peekable();
    let mut last = String::new();
    while let Some(seg) = iter.next() {
        if iter.peek().is_none() {
            last = seg.to_string();
            break;
        }
        cur = ensure_subdoc(cur, seg);
    }
    (cur, last)
}

fn set_path(root: &mut BsonDocument, path: &str, value: Bson) -> bool {
    let (parent, last) = traverse_to_parent(root, path);
    let old = parent.insert(last, value.clone());
    old.as_ref() != Some(&value)
}

fn unset_path(root: &mut BsonDocument, path: &str) -> bool {
    if get_path(root, path).is_none() {
        return false;
    }
    let (parent, last) = traverse_to_parent(root, path);
    parent.remove(&last).is_some()
}

fn as_i64(x: &Bson) -> Option<i64> {
    match x {
        Bson::Int32(i) => Some(i64::from(*i)),
        Bson::Int64(i) => Some(*i),
        _ => None,
    }
}

/// `current + by` with Mongo's widening: int32 stays int32 while it fits, int64 overflow is an error.
fn increment(path: &str, current: Option<&Bson>, by: &Bson) -> Result<Bson, DbError> {
    let overflow = || DbError::QueryError(format!("$inc overflow on '{path}'"));
    let Some(current) = current else {
        return Ok(by.clone());
    };
    if !is_num(current) {
        return Err(DbError::QueryError(format!("cannot apply $inc to non-numeric field '{path}'")));
    }
    match (current, by) {
        (Bson::Int32(a), Bson::Int32(b)) => {
            Ok(a.checked_add(*b).map_or_else(|| Bson::Int64(i64::from(*a) + i64::from(*b)), Bson::Int32))
        }
        (a, b) => match (as_i64(a), as_i64(b)) {
            (Some(x), Some(y)) => x.checked_add(y).map(Bson::Int64).ok_or_else(overflow),
            _ => {
                let sum = as_f64(a) + as_f64(b);
                if sum.is_finite() { Ok(Bson::Double(sum)) } else { Err(overflow()) }
            }
        },
    }
}

/// Apply an update to stored data (no `_id`). Returns whether anything changed.
///
/// On error `data` is left as it was.
///
/// # Errors
/// Returns `QueryError` when `$inc` targets a non-numeric field or overflows.
pub fn apply_update(data: &mut BsonDocument, update: &UpdateDoc) -> Result<bool, DbError> {
    match update {
        UpdateDoc::Replace(replacement) => {
            let mut next = replacement.clone();
            next.remove(ID_FIELD);
            let changed = *data != next;
            *data = next;
            Ok(changed)
        }
        UpdateDoc::Operators { set, inc, unset } => {
            let mut next = data.clone();
            let mut changed = false;
            for (k, v) in set {
                changed |= set_path(&mut next, k, v.clone());
            }
            for (k, by) in inc {
                let value = increment(k, get_path(&next, k), by)?;
                changed |= set_path(&mut next, k, value);
            }
            for k in unset {
                changed |= unset_path(&mut next, k);
            }
            *data = next;
            Ok(changed)
        }
    }
}

/// Document inserted by an upsert that matched nothing.
///
/// # Errors
/// Propagates `$inc` errors from applying the update to the seed.
pub fn upsert_seed(filter: &Filter, update: &UpdateDoc) -> Result<BsonDocument, DbError> {
    let mut seed = BsonDocument::new();
    for (k, v) in filter.equality_fields() {
        if k != ID_FIELD {
            seed.insert(k, v);
        }
    }
    match update {
        UpdateDoc::Replace(replacement) => {
            let mut doc = replacement.clone();
            doc.remove(ID_FIELD);
            Ok(doc)
        }
        UpdateDoc::Operators { .. } => {
            apply_update(&mut seed, update)?;
            Ok(seed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::parse_filter;
    use bson::doc;

    #[test]
    fn equality_and_ranges() {
        let d = doc! { "id": "3", "n": 5, "meta": { "tag": "x" } };
        assert!(eval_filter(&d, &parse_filter(&doc! { "id": "3" }).unwrap()));
        assert!(!eval_filter(&d, &parse_filter(&doc! { "id": "4" }).unwrap()));
        assert!(eval_filter(&d, &parse_filter(&doc! { "n": { "$gte": 5.0 } }).unwrap()));
        assert!(!eval_filter(&d, &parse_filter(&doc! { "n": { "$gt": "a" } }).unwrap()));
        assert!(eval_filter(&d, &parse_filter(&doc! { "meta.tag": "x" }).unwrap()));
        assert!(eval_filter(&d, &parse_filter(&doc! { "missing": { "$ne": 1 } }).unwrap()));
        assert!(eval_filter(&d, &parse_filter(&doc! { "$nor": [ { "id": "9" } ] }).unwrap()));
    }

    #[test]
    fn set_inc_unset() {
        let mut d = doc! { "a": 1, "b": "x" };
        let upd = UpdateDoc::Operators {
            set: vec![("c.d".into(), Bson::from("y"))],
            inc: vec![("a".into(), Bson::Int32(2))],
            unset: vec!["b".into(), "nope".into()],
        };
        assert!(apply_update(&mut d, &upd).unwrap());
        assert_eq!(d.get_i32("a").unwrap(), 3);
        assert!(d.get("b").is_none());
        assert_eq!(d.get_document("c").unwrap().get_str("d").unwrap(), "y");
    }

    #[test]
    fn setting_same_value_is_not_a_change() {
        let mut d = doc! { "a": "x" };
        assert!(!apply_update(&mut d, &UpdateDoc::set(doc! { "a": "x" })).unwrap());
    }

    #[test]
    fn seed_uses_filter_equalities() {
        let f = parse_filter(&doc! { "id": "10" }).unwrap();
        let seed = upsert_seed(&f, &UpdateDoc::set(doc! { "nazwa": "n" })).unwrap();
        assert_eq!(seed, doc! { "id": "10", "nazwa": "n" });
    }

    fn inc(field: &str, by: impl Into<Bson>) -> UpdateDoc {
        UpdateDoc::Operators { set: Vec::new(), inc: vec![(field.into(), by.into())], unset: Vec::new() }
    }

    #[test]
    fn inc_keeps_int32_until_it_overflows() {
        let mut d = doc! { "n": 1 };
        apply_update(&mut d, &inc("n", 1)).unwrap();
        assert_eq!(d.get("n"), Some(&Bson::Int32(2)));
        let mut d = doc! { "n": i32::MAX };
        apply_update(&mut d, &inc("n", 1)).unwrap();
        assert_eq!(d.get("n"), Some(&Bson::Int64(i64::from(i32::MAX) + 1)));
        let mut d = doc! { "n": 2 };
        apply_update(&mut d, &inc("n", 0.5)).unwrap();
        assert_eq!(d.get("n"), Some(&Bson::Double(2.5)));
    }

    #[test]
    fn inc_overflow_and_non_numeric_leave_document_alone() {
        let mut d = doc! { "n": i64::MAX, "s": "x" };
        let before = d.clone();
        assert!(matches!(apply_update(&mut d, &inc("n", 1)), Err(DbError::QueryError(_))));
        assert!(matches!(apply_update(&mut d, &inc("s", 5)), Err(DbError::QueryError(_))));
        let mut both = inc("s", 5);
        if let UpdateDoc::Operators { set, .. } = &mut both {
            set.push(("t".into(), Bson::from("y")));
        }
        assert!(apply_update(&mut d, &both).is_err());
        assert_eq!(d, before);
    }

    #[test]
    fn projection_follows_dotted_paths() {
        let d = doc! { "_id": "u", "id": "1", "meta": { "a": 1, "b": 2 } };
        let keep = Projection::Include { fields: vec!["meta.a".into()], keep_id: false };
        assert_eq!(project(&d, &keep), doc! { "meta": { "a": 1 } });
        let exc = Projection::Exclude(vec!["meta.b".into(), "_id".into()]);
        assert_eq!(project(&d, &exc), doc! { "id": "1", "meta": { "a": 1 } });
    }
}
