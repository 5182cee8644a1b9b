use crate::errors::DbError;
use crate::types::{DocumentId, SerializableBsonDocument, SerializableDateTime};
use bson::{Bson, Document as BsonDocument};
use chrono::Utc;
use serde::{Deserialize, Serialize};

pub const ID_FIELD: &str = "_id";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Metadata {
    pub created_at: SerializableDateTime,
    pub updated_at: SerializableDateTime,
}

impl Metadata {
    #[must_use]
    pub fn new() -> Self {
        let now = SerializableDateTime(Utc::now());
        Self { created_at: now.clone(), updated_at: now }
    }
}

impl Default for Metadata {
    fn default() -> Self {
        Self::new()
    }
}

/// A stored document. `data` never carries `_id`; the key lives in `id`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub data: SerializableBsonDocument,
    pub metadata: Metadata,
}

impl Document {
    #[must_use]
    pub fn new(data: BsonDocument) -> Self {
        Self { id: DocumentId::new(), data: SerializableBsonDocument(data), metadata: Metadata::new() }
    }

    /// Builds a document from caller data, honouring a caller-supplied `_id`.
    ///
    /// # Errors
    /// Returns `InvalidArgument` when `_id` is present but is not a UUID string.
    pub fn from_user(mut data: BsonDocument) -> Result<Self, DbError> {
        let id = match data.remove(ID_FIELD) {
            None => DocumentId::new(),
            Some(Bson::String(s)) => uuid::Uuid::parse_str(&s)
                .map(DocumentId)
                .map_err(|_| DbError::InvalidArgument(format!("_id must be a UUID string, got '{s}'")))?,
            Some(other) => {
                return Err(DbError::InvalidArgument(format!(
                    "_id must be a UUID string, got {other}"
                )));
            }
        };
        Ok(Self { id, data: SerializableBsonDocument(data), metadata: Metadata::new() })
    }

    /// The document as callers see it: `_id` first, then the stored fields.
    #[must_use]
    pub fn view(&self) -> BsonDocument {
        let mut out = BsonDocument::new();
        out.insert(ID_FIELD, self.id.to_string());
        for (k, v) in &self.data.0 {
            out.insert(k.clone(), v.clone());
        }
        out
    }

    pub fn update(&mut self, mut new_data: BsonDocument) {
        new_data.remove(ID_FIELD);
        self.data = SerializableBsonDocument(new_data);
        self.metadata.updated_at = SerializableDateTime(Utc::now());
    }
}
