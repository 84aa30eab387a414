use crate::errors::{DirNameError, ExtensionError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Component, Path};

static DIR_GRAMMAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new("^[A-Za-z0-9_-]+(?:/[A-Za-z0-9_-]+)*$").expect("directory grammar regex")
});

/// Validate a candidate upload directory and return its canonical form.
///
/// Repeated separators, `.` segments and trailing slashes are normalized
/// away first (`"dir2//"`, `"dir2/."` and `"dir2"` are the same directory),
/// then the normalized path must be relative and match
/// `segment("/"segment)*` with segments of letters, digits, `_` and `-`.
pub fn validate_upload_dir(candidate: &str) -> Result<String, DirNameError> {
    if candidate.is_empty() {
        return Err(DirNameError::Blank);
    }
    let normalized = normalize(candidate)?;
    if !DIR_GRAMMAR.is_match(&normalized) {
        return Err(DirNameError::Grammar);
    }
    Ok(normalized)
}

/// Collapse a candidate path to its normal components. Absolute paths are
/// rejected here; `..` segments are kept so they fall through to the
/// grammar check, which rejects dots.
fn normalize(candidate: &str) -> Result<String, DirNameError> {
    let mut segments: Vec<&str> = Vec::new();
    for component in Path::new(candidate).components() {
        match component {
            Component::RootDir | Component::Prefix(_) => return Err(DirNameError::Root),
            Component::CurDir => {}
            Component::ParentDir => segments.push(".."),
            Component::Normal(segment) => {
                segments.push(segment.to_str().ok_or(DirNameError::Grammar)?)
            }
        }
    }
    Ok(segments.join("/"))
}

/// Uploaded files must carry the single allowed extension, `.py`,
/// case-sensitively.
pub fn validate_python_extension(file_name: &str) -> Result<(), ExtensionError> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");
    if extension == "py" {
        Ok(())
    } else {
        Err(ExtensionError {
            extension: extension.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_directories_normalize_and_pass() {
        let cases = [
            ("dir1/", "dir1"),
            ("dir2", "dir2"),
            ("dir2//", "dir2"),
            ("dir2/.", "dir2"),
            ("./dir2", "dir2"),
            ("dir_3/dir-4/", "dir_3/dir-4"),
            ("A/b/C_9", "A/b/C_9"),
        ];
        for (candidate, expected) in cases {
            assert_eq!(
                validate_upload_dir(candidate).as_deref(),
                Ok(expected),
                "candidate {candidate:?}"
            );
        }
    }

    #[test]
    fn equivalent_spellings_normalize_to_the_same_directory() {
        assert_eq!(validate_upload_dir("dir2//"), validate_upload_dir("dir2"));
        assert_eq!(validate_upload_dir("dir2/."), validate_upload_dir("dir2"));
    }

    #[test]
    fn blank_is_rejected_first() {
        assert_eq!(validate_upload_dir(""), Err(DirNameError::Blank));
    }

    #[test]
    fn root_paths_are_rejected_as_root_never_grammar() {
        for candidate in ["/dir1/", "/dir2", "/dir_3/dir-4/", "/"] {
            assert_eq!(
                validate_upload_dir(candidate),
                Err(DirNameError::Root),
                "candidate {candidate:?}"
            );
        }
    }

    #[test]
    fn grammar_rejects_punctuation_spaces_and_dots() {
        let invalid = [
            "dir_3!/dir-4/",
            "!",
            "dir/dir.py",
            "dir name",
            "dir/..",
            "..",
            ".",
            "dir/#",
            "dir/a+b",
            "dir\\sub",
        ];
        for candidate in invalid {
            assert_eq!(
                validate_upload_dir(candidate),
                Err(DirNameError::Grammar),
                "candidate {candidate:?}"
            );
        }
    }

    #[test]
    fn grammar_rejects_control_characters() {
        for c in ['\t', '\n', '\x0b', '\x0c', '\r', '\x00'] {
            let candidate = format!("dir/{c}");
            assert_eq!(
                validate_upload_dir(&candidate),
                Err(DirNameError::Grammar),
                "candidate {candidate:?}"
            );
        }
    }

    #[test]
    fn python_extension_is_the_only_allowed_one() {
        assert!(validate_python_extension("test_suite.py").is_ok());
        assert!(validate_python_extension("nested.name.py").is_ok());

        let err = validate_python_extension("test_suite.go").unwrap_err();
        assert_eq!(
            err.to_string(),
            "File extension \"go\" is not allowed. Allowed extensions are: py."
        );
    }

    #[test]
    fn extension_check_is_case_sensitive_and_needs_a_real_suffix() {
        assert!(validate_python_extension("test_suite.PY").is_err());
        assert!(validate_python_extension("test_suite").is_err());
        // A leading dot alone is a hidden file, not an extension.
        assert!(validate_python_extension(".py").is_err());
    }
}
