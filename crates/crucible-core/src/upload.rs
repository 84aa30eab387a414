use crate::errors::{FieldErrors, UploadError};
use crate::storage::Store;
use crate::validate;
use anyhow::Context;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Result of a successful upload: the canonical directory and the stored
/// relative path, both as recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredUpload {
    pub test_file: String,
    pub upload_dir: String,
}

/// Accepts uploaded test files: validates name and target directory,
/// get-or-creates the bookkeeping rows, then writes the bytes under the
/// data root. Re-uploading the same name replaces content and never errors.
#[derive(Clone)]
pub struct UploadStore {
    store: Store,
    root: PathBuf,
}

impl UploadStore {
    pub fn new(store: Store, root: impl Into<PathBuf>) -> Self {
        Self {
            store,
            root: root.into(),
        }
    }

    pub fn store_test_file(
        &self,
        file_name: &str,
        bytes: &[u8],
        upload_dir: &str,
    ) -> Result<StoredUpload, UploadError> {
        // The multipart filename is client data; keep only its final
        // component so it cannot steer the write outside the target dir.
        let file_name = Path::new(file_name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("");

        let mut errors = FieldErrors::new();
        if let Err(e) = validate::validate_python_extension(file_name) {
            errors.push("test_file", e.to_string());
        }
        let directory = match validate::validate_upload_dir(upload_dir) {
            Ok(dir) => Some(dir),
            Err(e) => {
                errors.push("upload_dir", e.to_string());
                None
            }
        };
        let directory = match directory {
            Some(dir) if errors.is_empty() => dir,
            _ => return Err(UploadError::Validation(errors)),
        };

        let stored_path = format!("{directory}/{file_name}");
        let (dir_row, path_row) = self.store.record_upload(&directory, &stored_path)?;

        let full_path = self.root.join(&stored_path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(&full_path, bytes)
            .with_context(|| format!("failed to write {}", full_path.display()))?;
        tracing::info!(
            path = %path_row.path,
            bytes = bytes.len(),
            "stored test file"
        );

        Ok(StoredUpload {
            test_file: path_row.path,
            upload_dir: dir_row.directory,
        })
    }
}
