use crate::error::ApiError;
use crate::server::AppState;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use crucible_core::catalog::Assets;
use crucible_core::errors::{FieldErrors, EMPTY_LIST_MESSAGE, REQUIRED_FIELD_MESSAGE};
use crucible_core::model::RunRequest;
use crucible_core::upload::StoredUpload;
use serde::Deserialize;
use serde_json::Value;

const NO_FILE_MESSAGE: &str = "No file was submitted.";
const NOT_A_FILE_MESSAGE: &str =
    "The submitted data was not a file. Check the encoding type on the form.";

pub async fn healthz() -> Json<Value> {
    Json(serde_json::json!({ "ok": true }))
}

pub async fn assets(State(state): State<AppState>) -> Result<Json<Assets>, ApiError> {
    Ok(Json(state.catalog.list_assets()?))
}

enum FilePart {
    Missing,
    NotAFile,
    File { name: String, bytes: Vec<u8> },
}

pub async fn upload_test_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<StoredUpload>), ApiError> {
    let mut file = FilePart::Missing;
    let mut upload_dir: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("invalid multipart body: {e}")))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("test_file") => match field.file_name().map(str::to_owned) {
                Some(file_name) => {
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::bad_request(format!("failed to read upload: {e}")))?;
                    file = FilePart::File {
                        name: file_name,
                        bytes: bytes.to_vec(),
                    };
                }
                None => file = FilePart::NotAFile,
            },
            Some("upload_dir") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("failed to read field: {e}")))?;
                upload_dir = Some(text);
            }
            _ => {}
        }
    }

    let mut errors = FieldErrors::new();
    match &file {
        FilePart::Missing => errors.push("test_file", NO_FILE_MESSAGE),
        FilePart::NotAFile => errors.push("test_file", NOT_A_FILE_MESSAGE),
        FilePart::File { .. } => {}
    }
    if upload_dir.is_none() {
        errors.push("upload_dir", REQUIRED_FIELD_MESSAGE);
    }

    match (file, upload_dir) {
        (FilePart::File { name, bytes }, Some(upload_dir)) if errors.is_empty() => {
            let stored = state.uploads.store_test_file(&name, &bytes, &upload_dir)?;
            Ok((StatusCode::CREATED, Json(stored)))
        }
        _ => Err(ApiError::Validation(errors)),
    }
}

/// Permissive body so shape errors come back field-keyed instead of as a
/// deserializer rejection. `path` accepts one id or a list of ids.
#[derive(Debug, Deserialize)]
pub struct CreateRunRequestBody {
    #[serde(default)]
    pub requested_by: Option<Value>,
    #[serde(default)]
    pub env: Option<Value>,
    #[serde(default)]
    pub path: Option<Value>,
}

pub async fn create_test_run(
    State(state): State<AppState>,
    Json(body): Json<CreateRunRequestBody>,
) -> Result<(StatusCode, Json<RunRequest>), ApiError> {
    let (requested_by, env, paths) = coerce_run_request(&body).map_err(ApiError::Validation)?;
    let record = state.gateway.create(&requested_by, env, &paths).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn list_test_runs(
    State(state): State<AppState>,
) -> Result<Json<Vec<RunRequest>>, ApiError> {
    Ok(Json(state.gateway.list()?))
}

pub async fn get_test_run(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<RunRequest>, ApiError> {
    Ok(Json(state.gateway.get(id)?))
}

fn coerce_run_request(body: &CreateRunRequestBody) -> Result<(String, i64, Vec<i64>), FieldErrors> {
    let mut errors = FieldErrors::new();

    let requested_by = match &body.requested_by {
        None | Some(Value::Null) => {
            errors.push("requested_by", REQUIRED_FIELD_MESSAGE);
            None
        }
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            errors.push("requested_by", "Not a valid string.");
            None
        }
    };

    let env = match &body.env {
        None | Some(Value::Null) => {
            errors.push("env", REQUIRED_FIELD_MESSAGE);
            None
        }
        Some(value) => match coerce_pk(value) {
            Ok(id) => Some(id),
            Err(message) => {
                errors.push("env", message);
                None
            }
        },
    };

    let paths = match &body.path {
        None | Some(Value::Null) => {
            errors.push("path", EMPTY_LIST_MESSAGE);
            None
        }
        Some(Value::Array(items)) if items.is_empty() => {
            errors.push("path", EMPTY_LIST_MESSAGE);
            None
        }
        Some(Value::Array(items)) => {
            let mut ids = Vec::with_capacity(items.len());
            let mut ok = true;
            for item in items {
                match coerce_pk(item) {
                    Ok(id) => ids.push(id),
                    Err(message) => {
                        errors.push("path", message);
                        ok = false;
                        break;
                    }
                }
            }
            ok.then_some(ids)
        }
        Some(value) => match coerce_pk(value) {
            Ok(id) => Some(vec![id]),
            Err(message) => {
                errors.push("path", message);
                None
            }
        },
    };

    match (requested_by, env, paths) {
        (Some(requested_by), Some(env), Some(paths)) if errors.is_empty() => {
            Ok((requested_by, env, paths))
        }
        _ => Err(errors),
    }
}

// Form-style clients send pk values as digit strings; accept those, reject
// everything else with the received kind spelled out.
fn coerce_pk(value: &Value) -> Result<i64, String> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(id) => Ok(id),
            None => Err(incorrect_pk_message("float")),
        },
        Value::String(s) => s
            .parse::<i64>()
            .map_err(|_| incorrect_pk_message("str")),
        other => Err(incorrect_pk_message(json_kind(other))),
    }
}

fn incorrect_pk_message(kind: &str) -> String {
    format!("Incorrect type. Expected pk value, received {kind}.")
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "NoneType",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.as_i64().is_some() => "int",
        Value::Number(_) => "float",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}
