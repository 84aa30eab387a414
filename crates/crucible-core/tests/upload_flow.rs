use crucible_core::errors::UploadError;
use crucible_core::storage::Store;
use crucible_core::upload::UploadStore;
use tempfile::tempdir;

fn fresh_uploads(root: &std::path::Path) -> anyhow::Result<(Store, UploadStore)> {
    let store = Store::open(&root.join("crucible.db"))?;
    store.init_schema()?;
    let uploads = UploadStore::new(store.clone(), root.join("data"));
    Ok((store, uploads))
}

#[test]
fn upload_writes_file_and_records_rows() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let (store, uploads) = fresh_uploads(dir.path())?;

    let stored = uploads
        .store_test_file("test_suite.py", b"assert True", "new_dir")
        .expect("upload succeeds");
    assert_eq!(stored.upload_dir, "new_dir");
    assert_eq!(stored.test_file, "new_dir/test_suite.py");

    let on_disk = dir.path().join("data/new_dir/test_suite.py");
    assert_eq!(std::fs::read(&on_disk)?, b"assert True");

    let assets = store.list_file_paths()?;
    assert_eq!(assets.len(), 1);
    assert_eq!(assets[0].path, "new_dir/test_suite.py");

    Ok(())
}

#[test]
fn reupload_overwrites_content_without_duplicating_rows() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let (store, uploads) = fresh_uploads(dir.path())?;

    uploads
        .store_test_file("test_suite.py", b"first", "new_dir")
        .expect("first upload");
    uploads
        .store_test_file("test_suite.py", b"second, longer body", "new_dir")
        .expect("second upload");

    let on_disk = dir.path().join("data/new_dir/test_suite.py");
    assert_eq!(std::fs::read(&on_disk)?, b"second, longer body");
    assert_eq!(store.list_file_paths()?.len(), 1);
    assert_eq!(store.list_upload_dirs()?.len(), 1);

    Ok(())
}

#[test]
fn upload_dir_is_stored_in_canonical_form() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let (store, uploads) = fresh_uploads(dir.path())?;

    let stored = uploads
        .store_test_file("test_suite.py", b"x", "dir2//")
        .expect("upload succeeds");
    assert_eq!(stored.upload_dir, "dir2");
    assert_eq!(stored.test_file, "dir2/test_suite.py");

    // "dir2/." is the same directory; no second row appears.
    uploads
        .store_test_file("other.py", b"y", "dir2/.")
        .expect("upload succeeds");
    assert_eq!(store.list_upload_dirs()?.len(), 1);

    Ok(())
}

#[test]
fn wrong_extension_is_rejected_before_any_write() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let (store, uploads) = fresh_uploads(dir.path())?;

    let err = uploads
        .store_test_file("test_suite.go", b"package main", "new_dir")
        .expect_err("extension must be rejected");
    match err {
        UploadError::Validation(errors) => {
            assert_eq!(
                errors.messages("test_file"),
                Some(
                    &["File extension \"go\" is not allowed. Allowed extensions are: py."
                        .to_string()][..]
                )
            );
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert!(!dir.path().join("data").exists());
    assert!(store.list_file_paths()?.is_empty());
    assert!(store.list_upload_dirs()?.is_empty());

    Ok(())
}

#[test]
fn both_fields_fail_together() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let (_, uploads) = fresh_uploads(dir.path())?;

    let err = uploads
        .store_test_file("suite.go", b"x", "/abs/dir")
        .expect_err("both fields invalid");
    match err {
        UploadError::Validation(errors) => {
            assert!(errors.contains("test_file"));
            assert_eq!(
                errors.messages("upload_dir"),
                Some(&["Invalid folder name: cannot use file system root".to_string()][..])
            );
        }
        other => panic!("unexpected error: {other:?}"),
    }

    Ok(())
}

#[test]
fn traversal_in_the_file_name_is_flattened_to_its_basename() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let (_, uploads) = fresh_uploads(dir.path())?;

    let stored = uploads
        .store_test_file("../../escape.py", b"x", "safe_dir")
        .expect("upload succeeds");
    assert_eq!(stored.test_file, "safe_dir/escape.py");
    assert!(dir.path().join("data/safe_dir/escape.py").exists());
    assert!(!dir.path().join("escape.py").exists());

    Ok(())
}
