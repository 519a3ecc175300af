use std::path::Path;
use std::time::Duration;

use pipeline_logging::{pipeline_error, pipeline_info};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PublishError {
    #[error("repository error: {0}")]
    Repository(String),
    #[error("upload failed: {0}")]
    Upload(String),
}

/// Dataset-host collaborator. The host's storage semantics are out of
/// scope; implementations only promise that `upload_folder` is idempotent
/// for an unchanged folder.
#[async_trait::async_trait]
pub trait Publisher: Send + Sync {
    async fn ensure_repository(&self, repo_id: &str) -> Result<(), PublishError>;
    async fn upload_folder(&self, local_path: &Path, repo_id: &str) -> Result<(), PublishError>;
}

/// Publisher that logs what it would upload and succeeds. Used when no
/// dataset-host credentials are configured and as the test stand-in.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunPublisher;

#[async_trait::async_trait]
impl Publisher for DryRunPublisher {
    async fn ensure_repository(&self, repo_id: &str) -> Result<(), PublishError> {
        pipeline_info!("dry run: would ensure dataset repository {repo_id}");
        Ok(())
    }

    async fn upload_folder(&self, local_path: &Path, repo_id: &str) -> Result<(), PublishError> {
        pipeline_info!(
            "dry run: would upload {} to {repo_id}",
            local_path.display()
        );
        Ok(())
    }
}

/// Fixed attempt count and backoff for bundle publication, the only
/// operation in the pipeline with built-in retry.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_secs(10),
        }
    }
}

/// Publish one bundle directory, retrying the whole ensure+upload sequence
/// on failure. The final failure is returned so the caller can report it,
/// but publication failure does not abort anything else.
pub async fn publish_with_retry(
    publisher: &dyn Publisher,
    local_path: &Path,
    repo_id: &str,
    policy: RetryPolicy,
) -> Result<(), PublishError> {
    let attempts = policy.attempts.max(1);
    let mut last_err = PublishError::Upload("no attempts made".to_string());
    for attempt in 1..=attempts {
        let result = async {
            publisher.ensure_repository(repo_id).await?;
            publisher.upload_folder(local_path, repo_id).await
        }
        .await;
        match result {
            Ok(()) => {
                pipeline_info!("published {} to {repo_id}", local_path.display());
                return Ok(());
            }
            Err(err) => {
                pipeline_error!(
                    "publish attempt {attempt}/{attempts} for {repo_id} failed: {err}"
                );
                last_err = err;
                if attempt < attempts {
                    pipeline_info!("retrying in {:?}", policy.backoff);
                    tokio::time::sleep(policy.backoff).await;
                }
            }
        }
    }
    Err(last_err)
}
