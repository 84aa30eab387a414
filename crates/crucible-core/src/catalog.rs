use crate::model::{TestEnvironment, TestFilePath, TestUploadDirectory};
use crate::storage::Store;
use serde::Serialize;

/// The three lookup collections offered to clients for selection, each
/// ascending by its display field.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Assets {
    pub available_paths: Vec<TestFilePath>,
    pub test_envs: Vec<TestEnvironment>,
    pub upload_dirs: Vec<TestUploadDirectory>,
}

/// Read-only aggregation over the lookup tables. No side effects; an empty
/// store yields three empty lists.
#[derive(Clone)]
pub struct AssetCatalog {
    store: Store,
}

impl AssetCatalog {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn list_assets(&self) -> anyhow::Result<Assets> {
        Ok(Assets {
            available_paths: self.store.list_file_paths()?,
            test_envs: self.store.list_environments()?,
            upload_dirs: self.store.list_upload_dirs()?,
        })
    }
}
