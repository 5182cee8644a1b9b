use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

pub type CollectionName = String;

/// Surrogate key assigned to every stored document, exposed as the `_id` field.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub Uuid);

impl DocumentId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A `bson::Document` that survives non-self-describing formats such as bincode.
///
/// Stored as JSON text so the document can be rebuilt without `deserialize_any`.
/// Integers may come back widened to 64 bits.
#[derive(Debug, Clone, PartialEq)]
pub struct SerializableBsonDocument(pub bson::Document);

impl Serialize for SerializableBsonDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let text = serde_json::to_string(&self.0).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&text)
    }
}

impl<'de> Deserialize<'de> for SerializableBsonDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        let doc = serde_json::from_str::<bson::Document>(&text).map_err(serde::de::Error::custom)?;
        Ok(Self(doc))
    }
}

/// A `chrono::DateTime<Utc>` stored as RFC 3339 text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializableDateTime(pub DateTime<Utc>);

impl Serialize for SerializableDateTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_rfc3339())
    }
}

impl<'de> Deserialize<'de> for SerializableDateTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let dt =
            DateTime::parse_from_rfc3339(&s).map_err(serde::de::Error::custom)?.with_timezone(&Utc);
        Ok(Self(dt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bincode::config::standard;
    use bincode::serde::{decode_from_slice, encode_to_vec};

    #[test]
    fn bson_document_survives_bincode() {
        let original = SerializableBsonDocument(bson::doc! { "id": "7", "nazwa": "młotek", "n": 3 });
        let bytes = encode_to_vec(&original, standard()).unwrap();
        let (back, _): (SerializableBsonDocument, usize) =
            decode_from_slice(&bytes, standard()).unwrap();
        assert_eq!(back.0.get_str("nazwa").unwrap(), "młotek");
        assert!(matches!(back.0.get("n"), Some(bson::Bson::Int32(3) | bson::Bson::Int64(3))));
    }
}
