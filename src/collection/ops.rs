use super::core::Collection;
use crate::document::{Document, ID_FIELD};
use crate::errors::DbError;
use crate::query::{
    DeleteReport, Filter, Projection, UpdateDoc, UpdateReport, apply_update, eval_filter, get_path,
    project, upsert_seed,
};
use crate::types::DocumentId;
use bson::Document as BsonDocument;

fn key_of(data: &BsonDocument, field: &str) -> Option<String> {
    get_path(data, field).map(ToString::to_string)
}

/// First unique-key clash between `data` and `others`. Documents missing a key never clash on it.
fn find_conflict<'a>(
    others: impl IntoIterator<Item = &'a BsonDocument>,
    keys: &[String],
    data: &BsonDocument,
) -> Option<DbError> {
    let wanted: Vec<(&String, String)> =
        keys.iter().filter_map(|k| key_of(data, k).map(|v| (k, v))).collect();
    if wanted.is_empty() {
        return None;
    }
    for other in others {
        for (field, value) in &wanted {
            if key_of(other, field).as_ref() == Some(value) {
                return Some(DbError::DuplicateKey { field: (*field).clone(), value: value.clone() });
            }
        }
    }
    None
}

impl Collection {
    /// Register a unique key. Existing documents must already satisfy it.
    ///
    /// # Errors
    /// Returns `DuplicateKey` when two stored documents share a value for `field`.
    pub fn create_unique_key(&self, field: &str) -> Result<(), DbError> {
        let mut keys = self.unique_keys.write();
        if keys.iter().any(|k| k == field) {
            return Ok(());
        }
        let docs = self.docs.read();
        let probe = [field.to_string()];
        for (i, doc) in docs.iter().enumerate() {
            if let Some(err) = find_conflict(docs[..i].iter().map(|d| &d.data.0), &probe, &doc.data.0) {
                return Err(err);
            }
        }
        keys.push(field.to_string());
        log::debug!("collection '{}': unique key on '{field}'", self.name());
        Ok(())
    }

    /// # Errors
    /// Returns `DuplicateKey` on a unique-key clash or `InvalidArgument` for a bad `_id`.
    pub fn insert_one(&self, data: BsonDocument) -> Result<DocumentId, DbError> {
        let mut ids = self.insert_many(vec![data])?;
        Ok(ids.remove(0))
    }

    /// Insert a batch as a unit: any clash, against the store or inside the batch, rejects all of it.
    ///
    /// # Errors
    /// Returns `InvalidArgument` for an empty batch or bad `_id`, `DuplicateKey` on a clash.
    pub fn insert_many(&self, batch: Vec<BsonDocument>) -> Result<Vec<DocumentId>, DbError> {
        if batch.is_empty() {
            return Err(DbError::InvalidArgument("no documents to insert".into()));
        }
        let new_docs = batch.into_iter().map(Document::from_user).collect::<Result<Vec<_>, _>>()?;
        let keys = self.unique_keys.read().clone();
        let mut docs = self.docs.write();
        for (i, doc) in new_docs.iter().enumerate() {
            if docs.iter().chain(&new_docs[..i]).any(|d| d.id == doc.id) {
                return Err(DbError::DuplicateKey { field: ID_FIELD.into(), value: doc.id.to_string() });
            }
            let earlier = docs.iter().chain(&new_docs[..i]).map(|d| &d.data.0);
            if let Some(err) = find_conflict(earlier, &keys, &doc.data.0) {
                return Err(err);
            }
        }
        let ids = new_docs.iter().map(|d| d.id.clone()).collect();
        docs.extend(new_docs);
        Ok(ids)
    }

    /// Matching documents (as views with `_id`) in natural order.
    #[must_use]
    pub fn find(
        &self,
        filter: &Filter,
        projection: Option<&Projection>,
        limit: Option<usize>,
    ) -> Vec<BsonDocument> {
        let docs = self.docs.read();
        docs.iter()
            .map(Document::view)
            .filter(|view| eval_filter(view, filter))
            .take(limit.unwrap_or(usize::MAX))
            .map(|view| match projection {
                Some(p) => project(&view, p),
                None => view,
            })
            .collect()
    }

    #[must_use]
    pub fn find_one(&self, filter: &Filter, projection: Option<&Projection>) -> Option<BsonDocument> {
        self.find(filter, projection, Some(1)).into_iter().next()
    }

    /// Update one or all matching documents, inserting a seeded document on `upsert` when none match.
    ///
    /// Changes are staged first; a failed `$inc` or a unique-key clash in any of them leaves the
    /// collection untouched.
    ///
    /// # Errors
    /// Returns `InvalidArgument` for an empty update, `QueryError` for a bad `$inc` and
    /// `DuplicateKey` on a clash.
    pub fn update(
        &self,
        filter: &Filter,
        update: &UpdateDoc,
        multi: bool,
        upsert: bool,
    ) -> Result<UpdateReport, DbError> {
        if update.is_empty() {
            return Err(DbError::InvalidArgument("update document is empty".into()));
        }
        let keys = self.unique_keys.read().clone();
        let mut docs = self.docs.write();
        let targets: Vec<usize> = docs
            .iter()
            .enumerate()
            .filter(|(_, d)| eval_filter(&d.view(), filter))
            .map(|(i, _)| i)
            .take(if multi { usize::MAX } else { 1 })
            .collect();

        if targets.is_empty() {
            if !upsert {
                return Ok(UpdateReport::default());
            }
            let doc = Document::new(upsert_seed(filter, update)?);
            if let Some(err) = find_conflict(docs.iter().map(|d| &d.data.0), &keys, &doc.data.0) {
                return Err(err);
            }
            let id = doc.id.to_string();
            docs.push(doc);
            return Ok(UpdateReport { matched: 0, modified: 0, upserted_id: Some(id) });
        }

        let mut staged = Vec::with_capacity(targets.len());
        for &i in &targets {
            let mut data = docs[i].data.0.clone();
            if apply_update(&mut data, update)? {
                staged.push((i, data));
            }
        }
        for (n, (_, data)) in staged.iter().enumerate() {
            // Compare against untouched documents and the staged changes before this one.
            let untouched = docs
                .iter()
                .enumerate()
                .filter(|(j, _)| !staged.iter().any(|(s, _)| s == j))
                .map(|(_, d)| &d.data.0);
            let earlier = staged[..n].iter().map(|(_, d)| d);
            if let Some(err) = find_conflict(untouched.chain(earlier), &keys, data) {
                return Err(err);
            }
        }
        let modified = staged.len() as u64;
        for (i, data) in staged {
            docs[i].update(data);
        }
        Ok(UpdateReport { matched: targets.len() as u64, modified, upserted_id: None })
    }

    #[must_use]
    pub fn delete(&self, filter: &Filter, multi: bool) -> DeleteReport {
        let mut docs = self.docs.write();
        let before = docs.len();
        if multi {
            docs.retain(|d| !eval_filter(&d.view(), filter));
        } else if let Some(pos) = docs.iter().position(|d| eval_filter(&d.view(), filter)) {
            docs.remove(pos);
        }
        DeleteReport { deleted: (before - docs.len()) as u64 }
    }
}
