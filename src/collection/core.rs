use crate::document::Document;
use parking_lot::RwLock;

pub struct Collection {
    name: String,
    pub(crate) docs: RwLock<Vec<Document>>,
    pub(crate) unique_keys: RwLock<Vec<String>>,
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .field("len", &self.docs.read().len())
            .field("unique_keys", &*self.unique_keys.read())
            .finish()
    }
}

impl Collection {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), docs: RwLock::new(Vec::new()), unique_keys: RwLock::new(Vec::new()) }
    }

    /// Rebuild a collection from persisted parts; documents keep their stored order.
    #[must_use]
    pub fn from_parts(name: impl Into<String>, unique_keys: Vec<String>, docs: Vec<Document>) -> Self {
        Self { name: name.into(), docs: RwLock::new(docs), unique_keys: RwLock::new(unique_keys) }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }

    #[must_use]
    pub fn unique_keys(&self) -> Vec<String> {
        self.unique_keys.read().clone()
    }

    /// Clone of every stored document in natural order.
    #[must_use]
    pub fn documents(&self) -> Vec<Document> {
        self.docs.read().clone()
    }
}
