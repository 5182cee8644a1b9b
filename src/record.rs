use bson::{Bson, Document as BsonDocument, doc};
use serde::{Deserialize, Serialize};

/// Form columns, in display order. `id` is the lookup key.
pub const COLUMNS: [&str; 4] = ["id", "nazwa", "opis", "kategoria"];
pub const KEY_COLUMN: &str = "id";

/// One row of the fixed-schema collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub nazwa: String,
    pub opis: String,
    pub kategoria: String,
}

impl Record {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        nazwa: impl Into<String>,
        opis: impl Into<String>,
        kategoria: impl Into<String>,
    ) -> Self {
        Self { id: id.into(), nazwa: nazwa.into(), opis: opis.into(), kategoria: kategoria.into() }
    }

    /// Build from values in [`COLUMNS`] order.
    #[must_use]
    pub fn from_values(values: &[String; 4]) -> Self {
        let [id, nazwa, opis, kategoria] = values.clone();
        Self { id, nazwa, opis, kategoria }
    }

    #[must_use]
    pub fn values(&self) -> [&str; 4] {
        [&self.id, &self.nazwa, &self.opis, &self.kategoria]
    }

    /// Columns left blank (whitespace counts as blank).
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        COLUMNS
            .iter()
            .zip(self.values())
            .filter(|(_, v)| v.trim().is_empty())
            .map(|(c, _)| *c)
            .collect()
    }

    #[must_use]
    pub fn to_document(&self) -> BsonDocument {
        doc! {
            "id": self.id.clone(),
            "nazwa": self.nazwa.clone(),
            "opis": self.opis.clone(),
            "kategoria": self.kategoria.clone(),
        }
    }

    /// Everything but the key, for `$set` updates.
    #[must_use]
    pub fn changes(&self) -> BsonDocument {
        let mut d = self.to_document();
        d.remove(KEY_COLUMN);
        d
    }

    /// Read a record back from a stored document; missing or non-string fields become blank.
    #[must_use]
    pub fn from_document(doc: &BsonDocument) -> Self {
        let text = |k: &str| match doc.get(k) {
            Some(Bson::String(s)) => s.clone(),
            Some(Bson::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        Self { id: text("id"), nazwa: text("nazwa"), opis: text("opis"), kategoria: text("kategoria") }
    }
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{id: {:?}, nazwa: {:?}, opis: {:?}, kategoria: {:?}}}",
            self.id, self.nazwa, self.opis, self.kategoria
        )
    }
}
