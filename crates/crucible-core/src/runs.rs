use crate::dispatch::RunnerNotifier;
use crate::errors::{
    invalid_pk_message, FieldErrors, RunRequestError, BLANK_FIELD_MESSAGE, EMPTY_LIST_MESSAGE,
};
use crate::model::RunRequest;
use crate::storage::Store;
use std::sync::Arc;

/// Records run requests and hands the new id to the external runner.
/// Status and logs of a persisted request are owned by the runner from
/// then on; this gateway only reads them back.
#[derive(Clone)]
pub struct RunRequestGateway {
    store: Store,
    notifier: Arc<dyn RunnerNotifier>,
}

impl RunRequestGateway {
    pub fn new(store: Store, notifier: Arc<dyn RunnerNotifier>) -> Self {
        Self { store, notifier }
    }

    pub async fn create(
        &self,
        requested_by: &str,
        env_id: i64,
        path_ids: &[i64],
    ) -> Result<RunRequest, RunRequestError> {
        let mut errors = FieldErrors::new();
        if requested_by.trim().is_empty() {
            errors.push("requested_by", BLANK_FIELD_MESSAGE);
        }
        if self.store.environment_name(env_id)?.is_none() {
            errors.push("env", invalid_pk_message(env_id));
        }
        if path_ids.is_empty() {
            errors.push("path", EMPTY_LIST_MESSAGE);
        } else {
            for id in self.store.missing_path_ids(path_ids)? {
                errors.push("path", invalid_pk_message(id));
            }
        }
        if !errors.is_empty() {
            return Err(RunRequestError::Validation(errors));
        }

        let record = self
            .store
            .create_run_request(requested_by, env_id, path_ids)?;
        tracing::info!(
            run_request_id = record.id,
            env = env_id,
            paths = path_ids.len(),
            requested_by,
            "created test run request"
        );

        // Post-commit hand-off. On failure the record stays CREATED; the
        // caller surfaces the dispatch error without rolling back.
        if let Err(e) = self.notifier.notify_run_requested(record.id).await {
            tracing::error!(run_request_id = record.id, error = %e, "runner notification failed");
            return Err(RunRequestError::Dispatch(e));
        }
        Ok(record)
    }

    pub fn get(&self, id: i64) -> Result<RunRequest, RunRequestError> {
        self.store
            .get_run_request(id)?
            .ok_or(RunRequestError::NotFound(id))
    }

    pub fn list(&self) -> Result<Vec<RunRequest>, RunRequestError> {
        Ok(self.store.list_run_requests()?)
    }
}
