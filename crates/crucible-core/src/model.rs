use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestEnvironment {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestFilePath {
    pub id: i64,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestUploadDirectory {
    pub id: i64,
    pub directory: String,
}

/// Lifecycle of a run request. The API layer only ever writes `Created`;
/// every later transition belongs to the external runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Success,
    Running,
    Failed,
    Created,
    Retrying,
    FailedToStart,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Success => "SUCCESS",
            RunStatus::Running => "RUNNING",
            RunStatus::Failed => "FAILED",
            RunStatus::Created => "CREATED",
            RunStatus::Retrying => "RETRYING",
            RunStatus::FailedToStart => "FAILED_TO_START",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "SUCCESS" => RunStatus::Success,
            "RUNNING" => RunStatus::Running,
            "FAILED" => RunStatus::Failed,
            "CREATED" => RunStatus::Created,
            "RETRYING" => RunStatus::Retrying,
            "FAILED_TO_START" => RunStatus::FailedToStart,
            _ => RunStatus::FailedToStart, // Default fallback
        }
    }

    /// Closed (name, label) table for display pickers, in declaration order.
    pub fn choices() -> &'static [(&'static str, &'static str)] {
        &[
            ("SUCCESS", "SUCCESS"),
            ("RUNNING", "RUNNING"),
            ("FAILED", "FAILED"),
            ("CREATED", "CREATED"),
            ("RETRYING", "RETRYING"),
            ("FAILED_TO_START", "FAILED_TO_START"),
        ]
    }
}

/// A client-submitted request to run one or more test files against one
/// environment. `logs` is populated on the single-item read and omitted
/// from list responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRequest {
    pub id: i64,
    pub requested_by: String,
    pub env: i64,
    pub path: Vec<i64>,
    pub status: RunStatus,
    pub created_at: String,
    pub env_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_over_the_closed_variant_list() {
        for (name, _) in RunStatus::choices() {
            assert_eq!(RunStatus::parse(name).as_str(), *name);
        }
    }

    #[test]
    fn status_choices_table_is_fixed() {
        assert_eq!(
            RunStatus::choices(),
            &[
                ("SUCCESS", "SUCCESS"),
                ("RUNNING", "RUNNING"),
                ("FAILED", "FAILED"),
                ("CREATED", "CREATED"),
                ("RETRYING", "RETRYING"),
                ("FAILED_TO_START", "FAILED_TO_START"),
            ]
        );
    }

    #[test]
    fn unknown_status_text_falls_back_to_failed_to_start() {
        assert_eq!(RunStatus::parse("garbage"), RunStatus::FailedToStart);
        assert_eq!(RunStatus::parse(""), RunStatus::FailedToStart);
    }

    #[test]
    fn status_serializes_as_screaming_snake_case() {
        let json = serde_json::to_string(&RunStatus::FailedToStart).unwrap();
        assert_eq!(json, "\"FAILED_TO_START\"");
    }
}
