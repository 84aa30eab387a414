use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

pub const REQUIRED_FIELD_MESSAGE: &str = "This field is required.";
pub const BLANK_FIELD_MESSAGE: &str = "This field may not be blank.";
pub const EMPTY_LIST_MESSAGE: &str = "This list may not be empty.";

pub fn invalid_pk_message(id: i64) -> String {
    format!("Invalid pk \"{id}\" - object does not exist.")
}

/// Per-field validation messages, keyed by the wire field name. Serializes
/// directly as the 400 response body: `{"field": ["message", ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn messages(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Directory-name rejection, in the order the checks run. Root is kept
/// distinct from the grammar failure: callers display the more actionable
/// message for absolute paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DirNameError {
    #[error("This field may not be blank.")]
    Blank,
    #[error("Invalid folder name: cannot use file system root")]
    Root,
    #[error("Invalid folder name: only letters, numbers, underlines and dashes separated by single slashes allowed")]
    Grammar,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("File extension \"{extension}\" is not allowed. Allowed extensions are: py.")]
pub struct ExtensionError {
    pub extension: String,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("{0}")]
    Validation(FieldErrors),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum RunRequestError {
    #[error("{0}")]
    Validation(FieldErrors),
    #[error("test run request {0} does not exist")]
    NotFound(i64),
    #[error("failed to notify runner: {0}")]
    Dispatch(anyhow::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
