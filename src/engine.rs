use crate::collection::Collection;
use crate::errors::DbError;
use crate::snapshot::{self, CollectionImage, DbImage};
use crate::types::CollectionName;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Engine configuration.
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    /// Snapshot file; `None` keeps everything in memory.
    pub snapshot_path: Option<PathBuf>,
}

impl EngineOptions {
    #[must_use]
    pub const fn in_memory() -> Self {
        Self { snapshot_path: None }
    }

    #[must_use]
    pub fn persistent(path: impl Into<PathBuf>) -> Self {
        Self { snapshot_path: Some(path.into()) }
    }
}

/// The embedded document engine: named collections plus optional snapshot persistence.
pub struct Engine {
    options: EngineOptions,
    // Insertion-ordered names so snapshots and listings are stable.
    order: RwLock<Vec<CollectionName>>,
    collections: RwLock<HashMap<CollectionName, Arc<Collection>>>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("options", &self.options)
            .field("collections", &*self.order.read())
            .finish()
    }
}

impl Engine {
    /// Open an engine, loading the snapshot when one exists at the configured path.
    ///
    /// # Errors
    /// Returns an error if the snapshot exists but cannot be read or decoded.
    pub fn open(options: EngineOptions) -> Result<Self, DbError> {
        let engine = Self {
            options,
            order: RwLock::new(Vec::new()),
            collections: RwLock::new(HashMap::new()),
        };
        if let Some(path) = &engine.options.snapshot_path
            && path.exists()
        {
            let image = snapshot::read_snapshot(path)?;
            log::info!(
                "loaded snapshot {} ({} collections)",
                path.display(),
                image.collections.len()
            );
            for col in image.collections {
                engine.register(Collection::from_parts(col.name, col.unique_keys, col.documents));
            }
        }
        Ok(engine)
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            options: EngineOptions::in_memory(),
            order: RwLock::new(Vec::new()),
            collections: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub const fn options(&self) -> &EngineOptions {
        &self.options
    }

    fn register(&self, col: Collection) -> Arc<Collection> {
        let name = col.name().to_string();
        let arc = Arc::new(col);
        let mut cols = self.collections.write();
        if cols.insert(name.clone(), arc.clone()).is_none() {
            self.order.write().push(name);
        }
        arc
    }

    #[must_use]
    pub fn collection(&self, name: &str) -> Option<Arc<Collection>> {
        self.collections.read().get(name).cloned()
    }

    /// Fetch a collection, creating it on first use.
    pub fn get_or_create(&self, name: &str) -> Arc<Collection> {
        if let Some(col) = self.collection(name) {
            return col;
        }
        log::debug!("creating collection '{name}'");
        self.register(Collection::new(name))
    }

    pub fn drop_collection(&self, name: &str) -> bool {
        let removed = self.collections.write().remove(name).is_some();
        if removed {
            self.order.write().retain(|n| n != name);
        }
        removed
    }

    #[must_use]
    pub fn list_collection_names(&self) -> Vec<String> {
        self.order.read().clone()
    }

    /// Image of the whole engine in a stable order.
    #[must_use]
    pub fn image(&self) -> DbImage {
        let cols = self.collections.read();
        let collections = self
            .order
            .read()
            .iter()
            .filter_map(|n| cols.get(n))
            .map(|c| CollectionImage {
                name: c.name().to_string(),
                unique_keys: c.unique_keys(),
                documents: c.documents(),
            })
            .collect();
        DbImage { collections }
    }

    /// Persist the snapshot; a no-op for in-memory engines.
    ///
    /// # Errors
    /// Returns an error if the snapshot cannot be encoded or written.
    pub fn flush(&self) -> Result<(), DbError> {
        let Some(path) = &self.options.snapshot_path else {
            return Ok(());
        };
        snapshot::write_snapshot(path, &self.image())?;
        log::debug!("snapshot written to {}", path.display());
        Ok(())
    }
}
