use crate::document::ID_FIELD;
use crate::errors::DbError;
use bson::{Bson, Document as BsonDocument};

use super::types::{
    CmpOp, Filter, MAX_FILTER_DEPTH, MAX_IN_SET, MAX_PROJECTION_FIELDS, MAX_UPDATE_FIELDS,
    Projection, UpdateDoc,
};

/// Parse a JSON string into a `bson::Document`. The JSON must be a top-level object.
///
/// # Errors
/// Returns an error on malformed JSON or a non-object top level.
pub fn parse_json_document(json: &str) -> Result<BsonDocument, DbError> {
    let val: serde_json::Value = serde_json::from_str(json)?;
    let obj = match val {
        serde_json::Value::Object(obj) => obj,
        _ => return Err(DbError::InvalidArgument("expected a JSON object".into())),
    };
    BsonDocument::try_from(obj).map_err(|e| DbError::InvalidArgument(e.to_string()))
}

/// Parse a Mongo-style filter document (`{}` matches everything).
///
/// # Errors
/// Returns `QueryError` on unknown operators or malformed operands.
pub fn parse_filter(doc: &BsonDocument) -> Result<Filter, DbError> {
    parse_filter_at(doc, 0)
}

/// # Errors
/// Returns an error if the JSON string cannot be parsed into a filter.
pub fn parse_filter_json(json: &str) -> Result<Filter, DbError> {
    parse_filter(&parse_json_document(json)?)
}

fn parse_filter_at(doc: &BsonDocument, depth: usize) -> Result<Filter, DbError> {
    if depth > MAX_FILTER_DEPTH {
        return Err(DbError::QueryError("filter nested too deeply".into()));
    }
    let mut clauses = Vec::with_capacity(doc.len());
    for (key, value) in doc {
        let clause = match key.as_str() {
            "$and" => Filter::And(parse_clause_list(key, value, depth)?),
            "$or" => Filter::Or(parse_clause_list(key, value, depth)?),
            "$nor" => Filter::Nor(parse_clause_list(key, value, depth)?),
            k if k.starts_with('$') => {
                return Err(DbError::QueryError(format!("unknown top-level operator {k}")));
            }
            path => match value {
                Bson::Document(ops) if is_operator_doc(ops) => parse_field_ops(path, ops)?,
                other => Filter::Cmp { path: path.to_string(), op: CmpOp::Eq, value: other.clone() },
            },
        };
        clauses.push(clause);
    }
    Ok(match clauses.len() {
        0 => Filter::True,
        1 => clauses.remove(0),
        _ => Filter::And(clauses),
    })
}

fn parse_clause_list(op: &str, value: &Bson, depth: usize) -> Result<Vec<Filter>, DbError> {
    let Bson::Array(items) = value else {
        return Err(DbError::QueryError(format!("{op} requires an array")));
    };
    if items.is_empty() {
        return Err(DbError::QueryError(format!("{op} requires a non-empty array")));
    }
    items
        .iter()
        .map(|item| match item {
            Bson::Document(d) => parse_filter_at(d, depth + 1),
            _ => Err(DbError::QueryError(format!("{op} entries must be documents"))),
        })
        .collect()
}

fn is_operator_doc(doc: &BsonDocument) -> bool {
    doc.keys().next().is_some_and(|k| k.starts_with('$'))
}

fn parse_field_ops(path: &str, ops: &BsonDocument) -> Result<Filter, DbError> {
    let mut out = Vec::with_capacity(ops.len());
    for (op, operand) in ops {
        let f = match op.as_str() {
            "$eq" => cmp(path, CmpOp::Eq, operand),
            "$ne" => cmp(path, CmpOp::Ne, operand),
            "$gt" => cmp(path, CmpOp::Gt, operand),
            "$gte" => cmp(path, CmpOp::Gte, operand),
            "$lt" => cmp(path, CmpOp::Lt, operand),
            "$lte" => cmp(path, CmpOp::Lte, operand),
            "$in" => Filter::In { path: path.to_string(), values: value_set(op, operand)? },
            "$nin" => Filter::Nin { path: path.to_string(), values: value_set(op, operand)? },
            "$exists" => Filter::Exists { path: path.to_string(), exists: truthy(operand) },
            other => {
                return Err(DbError::QueryError(format!("unknown operator {other} on '{path}'")));
            }
        };
        out.push(f);
    }
    Ok(if out.len() == 1 { out.remove(0) } else { Filter::And(out) })
}

fn cmp(path: &str, op: CmpOp, value: &Bson) -> Filter {
    Filter::Cmp { path: path.to_string(), op, value: value.clone() }
}

fn value_set(op: &str, operand: &Bson) -> Result<Vec<Bson>, DbError> {
    match operand {
        Bson::Array(vals) if vals.len() > MAX_IN_SET => {
            Err(DbError::QueryError(format!("{op} accepts at most {MAX_IN_SET} values")))
        }
        Bson::Array(vals) => Ok(vals.clone()),
        _ => Err(DbError::QueryError(format!("{op} requires an array"))),
    }
}

fn truthy(v: &Bson) -> bool {
    match v {
        Bson::Boolean(b) => *b,
        Bson::Int32(i) => *i != 0,
        Bson::Int64(i) => *i != 0,
        Bson::Double(f) => *f != 0.0,
        Bson::Null => false,
        _ => true,
    }
}

/// Parse an update document: either `$set`/`$unset`/`$inc` operators or a plain replacement.
///
/// # Errors
/// Returns an error for empty updates, mixed operator/plain keys or bad operands.
pub fn parse_update(doc: &BsonDocument) -> Result<UpdateDoc, DbError> {
    if doc.is_empty() {
        return Err(DbError::InvalidArgument("update document is empty".into()));
    }
    let operator_keys = doc.keys().filter(|k| k.starts_with('$')).count();
    if operator_keys == 0 {
        let mut replacement = doc.clone();
        replacement.remove(ID_FIELD);
        return Ok(UpdateDoc::Replace(replacement));
    }
    if operator_keys != doc.len() {
        return Err(DbError::QueryError("update mixes operators and plain fields".into()));
    }

    let mut set = Vec::new();
    let mut inc = Vec::new();
    let mut unset = Vec::new();
    for (op, operand) in doc {
        let Bson::Document(fields) = operand else {
            // `$unset` also accepts a list of field names.
            if let ("$unset", Bson::Array(names)) = (op.as_str(), operand) {
                check_update_width(op, names.len())?;
                for n in names {
                    match n {
                        Bson::String(s) => unset.push(s.clone()),
                        _ => return Err(DbError::QueryError("$unset names must be strings".into())),
                    }
                }
                continue;
            }
            return Err(DbError::QueryError(format!("{op} requires a document")));
        };
        check_update_width(op, fields.len())?;
        for (field, value) in fields {
            if field == ID_FIELD {
                return Err(DbError::QueryError("_id is immutable".into()));
            }
            match op.as_str() {
                "$set" => set.push((field.clone(), value.clone())),
                "$unset" => unset.push(field.clone()),
                "$inc" => match value {
                    Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) => inc.push((field.clone(), value.clone())),
                    _ => return Err(DbError::QueryError("$inc requires numeric".into())),
                },
                other => return Err(DbError::QueryError(format!("unknown update operator {other}"))),
            }
        }
    }
    let update = UpdateDoc::Operators { set, inc, unset };
    if update.is_empty() {
        return Err(DbError::InvalidArgument("update document is empty".into()));
    }
    Ok(update)
}

fn check_update_width(op: &str, n: usize) -> Result<(), DbError> {
    if n > MAX_UPDATE_FIELDS {
        return Err(DbError::QueryError(format!("{op} accepts at most {MAX_UPDATE_FIELDS} fields")));
    }
    Ok(())
}

/// # Errors
/// Returns an error if the JSON string cannot be parsed into an update.
pub fn parse_update_json(json: &str) -> Result<UpdateDoc, DbError> {
    parse_update(&parse_json_document(json)?)
}

/// Parse a projection such as `{"nazwa": 1}` or `{"opis": 0, "_id": 0}`.
///
/// # Errors
/// Returns `QueryError` when inclusion and exclusion are mixed (other than `_id`).
pub fn parse_projection(doc: &BsonDocument) -> Result<Projection, DbError> {
    let mut include = Vec::new();
    let mut exclude = Vec::new();
    if doc.len() > MAX_PROJECTION_FIELDS {
        return Err(DbError::QueryError(format!("projection accepts at most {MAX_PROJECTION_FIELDS} fields")));
    }
    let mut id_flag = None;
    for (field, flag) in doc {
        let on = truthy(flag);
        if field == ID_FIELD {
            id_flag = Some(on);
        } else if on {
            include.push(field.clone());
        } else {
            exclude.push(field.clone());
        }
    }
    match (include.is_empty(), exclude.is_empty()) {
        (false, false) => {
            Err(DbError::QueryError("projection cannot mix inclusion and exclusion".into()))
        }
        (false, true) => Ok(Projection::Include { fields: include, keep_id: id_flag.unwrap_or(true) }),
        (true, _) => match id_flag {
            Some(true) if exclude.is_empty() => {
                Ok(Projection::Include { fields: Vec::new(), keep_id: true })
            }
            Some(false) => {
                exclude.push(ID_FIELD.to_string());
                Ok(Projection::Exclude(exclude))
            }
            _ => Ok(Projection::Exclude(exclude)),
        },
    }
}

/// # Errors
/// Returns an error if the JSON string cannot be parsed into a projection.
pub fn parse_projection_json(json: &str) -> Result<Projection, DbError> {
    parse_projection(&parse_json_document(json)?)
}
