use crate::api::{DbApi, Found, Insert};
use crate::errors::DbError;
use crate::query::{Filter, UpdateDoc, UpdateReport};
use crate::record::{KEY_COLUMN, Record};
use bson::Document as BsonDocument;
use std::sync::Arc;

/// CRUD collaborator the form drives. Records are addressed by their `id` column.
pub trait RecordBackend {
    /// # Errors
    /// Store failures, including `DuplicateKey` for a reused id.
    fn insert(&self, record: &Record) -> Result<(), DbError>;

    /// Number of records removed (0 or 1).
    ///
    /// # Errors
    /// Store failures.
    fn delete(&self, id: &str) -> Result<u64, DbError>;

    /// # Errors
    /// Store failures.
    fn find(&self, id: &str) -> Result<Option<BsonDocument>, DbError>;

    /// Overwrite the non-key columns of the record with `record.id`.
    ///
    /// # Errors
    /// Store failures; `NotFound` when no record has that id.
    fn update(&self, record: &Record) -> Result<UpdateReport, DbError>;

    /// Every record in natural order.
    ///
    /// # Errors
    /// Store failures.
    fn all(&self) -> Result<Vec<BsonDocument>, DbError>;
}

/// [`RecordBackend`] over one collection of a shared [`DbApi`] handle.
#[derive(Debug, Clone)]
pub struct CollectionBackend {
    api: Arc<DbApi>,
    collection: String,
}

impl CollectionBackend {
    #[must_use]
    pub fn new(api: Arc<DbApi>, collection: impl Into<String>) -> Self {
        Self { api, collection: collection.into() }
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    #[must_use]
    pub fn api(&self) -> &DbApi {
        &self.api
    }

    fn by_id(id: &str) -> Filter {
        Filter::eq(KEY_COLUMN, id)
    }
}

impl RecordBackend for CollectionBackend {
    fn insert(&self, record: &Record) -> Result<(), DbError> {
        self.api.insert(&self.collection, Insert::One(record.to_document())).map(|_| ())
    }

    fn delete(&self, id: &str) -> Result<u64, DbError> {
        Ok(self.api.delete(&self.collection, &Self::by_id(id), false)?.deleted)
    }

    fn find(&self, id: &str) -> Result<Option<BsonDocument>, DbError> {
        let found = self.api.find(&self.collection, Some(&Self::by_id(id)), true, None)?;
        Ok(found.and_then(|f| f.first().cloned()))
    }

    fn update(&self, record: &Record) -> Result<UpdateReport, DbError> {
        let changes = UpdateDoc::set(record.changes());
        self.api.update(&self.collection, &Self::by_id(&record.id), &changes, false, false)
    }

    fn all(&self) -> Result<Vec<BsonDocument>, DbError> {
        Ok(self.api.find(&self.collection, None, false, None)?.map(Found::into_vec).unwrap_or_default())
    }
}
