use super::uri::ConnectionUri;
use crate::collection::Collection;
use crate::engine::Engine;
use crate::errors::DbError;
use crate::logger::AUDIT_TARGET as AUDIT;
use crate::query::{DeleteReport, Filter, InsertReport, Projection, UpdateDoc, UpdateReport};
use bson::Document as BsonDocument;
use parking_lot::RwLock;
use std::sync::Arc;

/// Payload of an insert: a single document or a batch, never both.
#[derive(Debug, Clone, PartialEq)]
pub enum Insert {
    One(BsonDocument),
    Many(Vec<BsonDocument>),
}

impl Insert {
    /// Build from the optional single/batch pair a caller collected.
    ///
    /// # Errors
    /// Returns `InvalidArgument` when both or neither are supplied, or the batch is empty.
    pub fn from_parts(
        document: Option<BsonDocument>,
        documents: Option<Vec<BsonDocument>>,
    ) -> Result<Self, DbError> {
        match (document, documents) {
            (Some(_), Some(_)) => Err(DbError::InvalidArgument(
                "provide either a single document or a batch, not both".into(),
            )),
            (Some(doc), None) => Ok(Self::One(doc)),
            (None, Some(docs)) if !docs.is_empty() => Ok(Self::Many(docs)),
            _ => Err(DbError::InvalidArgument("no document(s) provided for insertion".into())),
        }
    }
}

/// Result of a successful, non-empty find.
#[derive(Debug, Clone, PartialEq)]
pub enum Found {
    One(BsonDocument),
    Many(Vec<BsonDocument>),
}

impl Found {
    #[must_use]
    pub fn into_vec(self) -> Vec<BsonDocument> {
        match self {
            Self::One(d) => vec![d],
            Self::Many(v) => v,
        }
    }

    #[must_use]
    pub fn first(&self) -> Option<&BsonDocument> {
        match self {
            Self::One(d) => Some(d),
            Self::Many(v) => v.first(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::One(_) => 1,
            Self::Many(v) => v.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Connection handle over the document engine.
///
/// Built disconnected by [`DbApi::new`]; every call except [`DbApi::connect`] fails fast with
/// [`DbError::NotConnected`] until a connection is established.
pub struct DbApi {
    uri: String,
    database: String,
    engine: RwLock<Option<Arc<Engine>>>,
}

impl std::fmt::Debug for DbApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbApi")
            .field("uri", &self.uri)
            .field("database", &self.database)
            .field("connected", &self.is_connected())
            .finish()
    }
}

fn audit<T>(op: &str, collection: &str, result: Result<T, DbError>) -> Result<T, DbError> {
    match &result {
        Ok(_) => log::info!(target: AUDIT, "op={op} collection={collection} outcome=ok"),
        Err(e) => {
            log::warn!("{op} on '{collection}' failed: {e}");
            log::info!(target: AUDIT, "op={op} collection={collection} outcome=error reason=\"{e}\"");
        }
    }
    result
}

impl DbApi {
    #[must_use]
    pub fn new(uri: impl Into<String>, database: impl Into<String>) -> Self {
        let api = Self { uri: uri.into(), database: database.into(), engine: RwLock::new(None) };
        log::info!("db api initialized for uri={} database={}", api.uri, api.database);
        api
    }

    /// Build and connect in one step; the startup path.
    ///
    /// # Errors
    /// Returns the connection error when the store cannot be reached.
    pub fn open(uri: impl Into<String>, database: impl Into<String>) -> Result<Self, DbError> {
        let api = Self::new(uri, database);
        api.connect()?;
        Ok(api)
    }

    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    #[must_use]
    pub fn database(&self) -> &str {
        &self.database
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.engine.read().is_some()
    }

    /// Connect to the configured store. Already connected is a success.
    ///
    /// # Errors
    /// Returns `UnsupportedUri` for unknown schemes, or the engine's error when a snapshot
    /// cannot be loaded. The handle stays disconnected on failure.
    pub fn connect(&self) -> Result<(), DbError> {
        let mut slot = self.engine.write();
        if slot.is_some() {
            log::info!("already connected to '{}'", self.database);
            return Ok(());
        }
        log::info!("connecting to {} ...", self.uri);
        let opened = ConnectionUri::parse(&self.uri)
            .and_then(|uri| Engine::open(uri.engine_options(&self.database)));
        match opened {
            Ok(engine) => {
                *slot = Some(Arc::new(engine));
                log::info!("connected to {} database={}", self.uri, self.database);
                Ok(())
            }
            Err(e) => {
                log::error!("connection to {} failed: {e}", self.uri);
                Err(e)
            }
        }
    }

    /// Flush and release the connection. Disconnecting twice is a success.
    ///
    /// # Errors
    /// Returns the flush error; the handle then stays connected so nothing is lost.
    pub fn disconnect(&self) -> Result<(), DbError> {
        let mut slot = self.engine.write();
        let Some(engine) = slot.as_ref() else {
            log::info!("not connected, nothing to disconnect");
            return Ok(());
        };
        if let Err(e) = engine.flush() {
            log::error!("error during disconnection: {e}");
            return Err(e);
        }
        *slot = None;
        log::info!("disconnected from {}", self.uri);
        Ok(())
    }

    fn engine(&self) -> Result<Arc<Engine>, DbError> {
        self.engine.read().clone().ok_or(DbError::NotConnected)
    }

    fn existing(&self, collection: &str) -> Result<Option<Arc<Collection>>, DbError> {
        Ok(self.engine()?.collection(collection))
    }

    // Write-through: a failed flush is logged, the in-memory change stands.
    fn persist(engine: &Engine) {
        if let Err(e) = engine.flush() {
            log::error!("snapshot flush failed: {e}");
        }
    }

    /// Declare `field` unique in `collection`, creating the collection if needed.
    ///
    /// # Errors
    /// `NotConnected`, or `DuplicateKey` when stored documents already clash.
    pub fn ensure_unique(&self, collection: &str, field: &str) -> Result<(), DbError> {
        let result = self.engine().and_then(|engine| {
            engine.get_or_create(collection).create_unique_key(field)?;
            Self::persist(&engine);
            Ok(())
        });
        audit("ensure_unique", collection, result)
    }

    /// # Errors
    /// `NotConnected`.
    pub fn list_collections(&self) -> Result<Vec<String>, DbError> {
        Ok(self.engine()?.list_collection_names())
    }

    /// Insert one document or a batch; the collection is created on first write.
    ///
    /// # Errors
    /// `NotConnected`, `DuplicateKey` (nothing is written), or `InvalidArgument`.
    pub fn insert(&self, collection: &str, payload: Insert) -> Result<InsertReport, DbError> {
        let result = self.engine().and_then(|engine| {
            let col = engine.get_or_create(collection);
            let ids = match payload {
                Insert::One(doc) => vec![col.insert_one(doc)?],
                Insert::Many(docs) => col.insert_many(docs)?,
            };
            Self::persist(&engine);
            log::info!("inserted {} document(s) into '{collection}'", ids.len());
            Ok(InsertReport { inserted_ids: ids.iter().map(ToString::to_string).collect() })
        });
        audit("insert", collection, result)
    }

    /// Delete the first (or every, with `multi`) match. No match is `deleted == 0`, not an error.
    ///
    /// # Errors
    /// `NotConnected`.
    pub fn delete(&self, collection: &str, filter: &Filter, multi: bool) -> Result<DeleteReport, DbError> {
        let result = self.engine().map(|engine| match engine.collection(collection) {
            Some(col) => {
                let report = col.delete(filter, multi);
                if report.deleted > 0 {
                    Self::persist(&engine);
                }
                log::info!("deleted {} document(s) from '{collection}'", report.deleted);
                report
            }
            None => DeleteReport::default(),
        });
        audit("delete", collection, result)
    }

    /// Find documents. `None` filter means everything; `one` returns at most one document.
    /// An empty result is `Ok(None)`.
    ///
    /// # Errors
    /// `NotConnected`.
    pub fn find(
        &self,
        collection: &str,
        filter: Option<&Filter>,
        one: bool,
        projection: Option<&Projection>,
    ) -> Result<Option<Found>, DbError> {
        let filter = filter.unwrap_or(&Filter::True);
        let result = self.existing(collection).map(|col| {
            let col = col?;
            if one {
                col.find_one(filter, projection).map(Found::One)
            } else {
                let docs = col.find(filter, projection, None);
                (!docs.is_empty()).then_some(Found::Many(docs))
            }
        });
        audit("find", collection, result)
    }

    /// Apply `changes` to the first (or every, with `multi`) match.
    ///
    /// # Errors
    /// `NotConnected`, `InvalidArgument` for empty changes, `DuplicateKey`, or `NotFound` when
    /// nothing matched and `upsert` is off.
    pub fn update(
        &self,
        collection: &str,
        filter: &Filter,
        changes: &UpdateDoc,
        multi: bool,
        upsert: bool,
    ) -> Result<UpdateReport, DbError> {
        let result = self.engine().and_then(|engine| {
            if changes.is_empty() {
                return Err(DbError::InvalidArgument("update document is empty".into()));
            }
            let col = if upsert {
                engine.get_or_create(collection)
            } else {
                engine.collection(collection).ok_or_else(|| DbError::NotFound(collection.to_string()))?
            };
            let report = col.update(filter, changes, multi, upsert)?;
            if report.matched == 0 && report.upserted_id.is_none() {
                return Err(DbError::NotFound(collection.to_string()));
            }
            if report.modified > 0 || report.upserted_id.is_some() {
                Self::persist(&engine);
            }
            log::info!(
                "update on '{collection}': matched={} modified={} upserted={:?}",
                report.matched,
                report.modified,
                report.upserted_id
            );
            Ok(report)
        });
        audit("update", collection, result)
    }
}
