use std::{path::PathBuf, sync::Arc};

use tracing::warn;

use super::{DocumentStore, SettingsStore, StoreId};

/// External collaborator that materializes store instances.
///
/// The registry calls this exactly once per unique [`StoreId`]; `None` means
/// creation failed and the registry degrades to defaults for that store.
pub trait StoreProvider: Send + Sync + 'static {
    /// Attempts to create a live store for `id`.
    fn create(&self, id: &StoreId) -> Option<Arc<dyn SettingsStore>>;
}

/// Provider resolving store documents from a directory tree.
///
/// A store `(app_id, name, subpath)` maps to
/// `root/<app_id>/<name>.toml`, or `root/<app_id>/<name>/<subpath>.toml`
/// when a subpath is given. Missing or unparseable documents fail creation.
pub struct DirectoryProvider {
    root: PathBuf,
}

impl DirectoryProvider {
    /// Creates a provider rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn document_path(&self, id: &StoreId) -> PathBuf {
        let base = self.root.join(&id.app_id);
        if id.subpath.is_empty() {
            base.join(format!("{}.toml", id.name))
        } else {
            base.join(&id.name).join(format!("{}.toml", id.subpath))
        }
    }
}

impl StoreProvider for DirectoryProvider {
    fn create(&self, id: &StoreId) -> Option<Arc<dyn SettingsStore>> {
        let path = self.document_path(id);

        match DocumentStore::load(&path) {
            Ok(store) => Some(Arc::new(store)),
            Err(e) => {
                warn!("Create store failed, id: {id}, path: {}: {e}", path.display());
                None
            }
        }
    }
}
