use crate::api::{DbApi, Found, Insert};
use crate::errors::DbError;
use crate::query::{Filter, UpdateDoc, parse_filter_json, parse_projection_json, parse_update_json};
use crate::record::{KEY_COLUMN, Record};
use bson::{Document as BsonDocument, doc};
use std::io::Write;

use super::command::Command;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OutputMode {
    Human,
    Plain,
    Json,
}

impl std::str::FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "human" => Ok(Self::Human),
            "plain" => Ok(Self::Plain),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown output format '{other}'")),
        }
    }
}

fn target_filter(id: Option<&str>, filter_json: Option<&str>) -> Result<Filter, DbError> {
    match (id, filter_json) {
        (Some(_), Some(_)) => Err(DbError::InvalidArgument("use either an id or a filter, not both".into())),
        (Some(id), None) => Ok(Filter::eq(KEY_COLUMN, id)),
        (None, Some(json)) => parse_filter_json(json),
        (None, None) => Ok(Filter::True),
    }
}

fn plain_row(doc: &BsonDocument) -> String {
    Record::from_document(doc).values().join("\t")
}

fn write_docs(out: &mut impl Write, docs: &[BsonDocument], mode: OutputMode) -> Result<(), Box<dyn std::error::Error>> {
    match mode {
        OutputMode::Json => writeln!(out, "{}", serde_json::to_string(docs)?)?,
        OutputMode::Plain => {
            for d in docs {
                writeln!(out, "{}", plain_row(d))?;
            }
        }
        OutputMode::Human => {
            for d in docs {
                writeln!(out, "{d}")?;
            }
        }
    }
    Ok(())
}

/// Execute `cmd` against `collection`, writing the outcome to `out`.
///
/// # Errors
/// Store errors, malformed JSON arguments, or write failures on `out`.
pub fn run(
    api: &DbApi,
    collection: &str,
    cmd: Command,
    mode: OutputMode,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        Command::Add { record } => {
            let missing = record.missing_fields();
            if !missing.is_empty() {
                return Err(DbError::InvalidArgument(format!("missing fields: {}", missing.join(", "))).into());
            }
            let report = api.insert(collection, Insert::One(record.to_document()))?;
            match mode {
                OutputMode::Json => writeln!(out, "{}", serde_json::to_string(&report)?)?,
                OutputMode::Plain => writeln!(out, "{}", report.inserted_ids.join(" "))?,
                OutputMode::Human => writeln!(out, "Dodano: {record}")?,
            }
        }
        Command::Find { id, filter_json, projection_json, one } => {
            let filter = target_filter(id.as_deref(), filter_json.as_deref())?;
            let projection = projection_json.as_deref().map(parse_projection_json).transpose()?;
            let docs = api
                .find(collection, Some(&filter), one, projection.as_ref())?
                .map(Found::into_vec)
                .unwrap_or_default();
            if docs.is_empty() && mode == OutputMode::Human {
                writeln!(out, "Nie znaleziono rekordów.")?;
            } else {
                write_docs(out, &docs, mode)?;
            }
        }
        Command::Delete { id, filter_json, many } => {
            if id.is_none() && filter_json.is_none() {
                return Err(DbError::InvalidArgument("delete needs an id or a filter".into()).into());
            }
            let filter = target_filter(id.as_deref(), filter_json.as_deref())?;
            let report = api.delete(collection, &filter, many)?;
            match mode {
                OutputMode::Json => writeln!(out, "{}", serde_json::to_string(&report)?)?,
                OutputMode::Plain => writeln!(out, "{}", report.deleted)?,
                OutputMode::Human if report.deleted == 0 => writeln!(out, "Brak pasujących rekordów.")?,
                OutputMode::Human => writeln!(out, "Usunięto rekordów: {}", report.deleted)?,
            }
        }
        Command::Update { id, nazwa, opis, kategoria, update_json, upsert } => {
            let changes = match update_json {
                Some(json) => parse_update_json(&json)?,
                None => {
                    let mut set = doc! {};
                    for (column, value) in [("nazwa", nazwa), ("opis", opis), ("kategoria", kategoria)] {
                        if let Some(v) = value {
                            set.insert(column, v);
                        }
                    }
                    UpdateDoc::set(set)
                }
            };
            let report = api.update(collection, &Filter::eq(KEY_COLUMN, id.as_str()), &changes, false, upsert)?;
            match mode {
                OutputMode::Json => writeln!(out, "{}", serde_json::to_string(&report)?)?,
                OutputMode::Plain => writeln!(out, "{} {}", report.matched, report.modified)?,
                OutputMode::Human => match &report.upserted_id {
                    Some(new_id) => writeln!(out, "Utworzono rekord ID={id} (_id={new_id})")?,
                    None => writeln!(out, "Zaktualizowano rekord ID={id} (zmienionych: {})", report.modified)?,
                },
            }
        }
        Command::List { last } => {
            let docs = api.find(collection, None, false, None)?.map(Found::into_vec).unwrap_or_default();
            let start = last.map_or(0, |n| docs.len().saturating_sub(n));
            if docs.is_empty() && mode == OutputMode::Human {
                writeln!(out, "Brak wyników w kolekcji.")?;
            } else {
                write_docs(out, &docs[start..], mode)?;
            }
        }
        Command::Collections => {
            let names = api.list_collections()?;
            match mode {
                OutputMode::Json => writeln!(out, "{}", serde_json::to_string(&names)?)?,
                OutputMode::Plain | OutputMode::Human => {
                    for n in names {
                        writeln!(out, "{n}")?;
                    }
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_mode_parsing() {
        assert_eq!("JSON".parse::<OutputMode>(), Ok(OutputMode::Json));
        assert_eq!("plain".parse::<OutputMode>(), Ok(OutputMode::Plain));
        assert!("xml".parse::<OutputMode>().is_err());
    }

    #[test]
    fn id_and_filter_are_exclusive() {
        assert!(target_filter(Some("1"), Some("{}")).is_err());
        assert_eq!(target_filter(None, None).unwrap(), Filter::True);
        assert_eq!(target_filter(Some("1"), None).unwrap(), Filter::eq("id", "1"));
    }
}
