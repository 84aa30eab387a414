use anyhow::Context;
use async_trait::async_trait;

/// Seam to the external runner. Implementations hand over the job id and
/// nothing else; they must not retry or queue.
#[async_trait]
pub trait RunnerNotifier: Send + Sync {
    async fn notify_run_requested(&self, run_request_id: i64) -> anyhow::Result<()>;
}

/// POSTs `{"run_request_id": <id>}` to the runner endpoint. A non-2xx
/// response is an error; the caller decides what that means for the
/// already-persisted record.
pub struct HttpRunnerNotifier {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpRunnerNotifier {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl RunnerNotifier for HttpRunnerNotifier {
    async fn notify_run_requested(&self, run_request_id: i64) -> anyhow::Result<()> {
        let resp = self
            .http
            .post(&self.endpoint)
            .json(&serde_json::json!({ "run_request_id": run_request_id }))
            .send()
            .await
            .context("runner notification request failed")?;
        if !resp.status().is_success() {
            anyhow::bail!("runner returned {}", resp.status());
        }
        tracing::debug!(run_request_id, endpoint = %self.endpoint, "runner notified");
        Ok(())
    }
}

/// No-op notifier for tests and deployments without a runner configured.
pub struct NullRunnerNotifier;

#[async_trait]
impl RunnerNotifier for NullRunnerNotifier {
    async fn notify_run_requested(&self, _run_request_id: i64) -> anyhow::Result<()> {
        Ok(())
    }
}
