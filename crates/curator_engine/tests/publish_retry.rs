use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use curator_engine::{publish_with_retry, DryRunPublisher, PublishError, Publisher, RetryPolicy};
use pretty_assertions::assert_eq;

/// Publisher failing the first `failures` upload attempts.
struct FlakyPublisher {
    failures: u32,
    ensure_calls: AtomicU32,
    upload_calls: AtomicU32,
}

impl FlakyPublisher {
    fn new(failures: u32) -> Self {
        Self {
            failures,
            ensure_calls: AtomicU32::new(0),
            upload_calls: AtomicU32::new(0),
        }
    }
}

#[async_trait::async_trait]
impl Publisher for FlakyPublisher {
    async fn ensure_repository(&self, _repo_id: &str) -> Result<(), PublishError> {
        self.ensure_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn upload_folder(&self, _local_path: &Path, _repo_id: &str) -> Result<(), PublishError> {
        let attempt = self.upload_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.failures {
            Err(PublishError::Upload("transient network error".to_string()))
        } else {
            Ok(())
        }
    }
}

fn fast_policy(attempts: u32) -> RetryPolicy {
    RetryPolicy {
        attempts,
        backoff: Duration::ZERO,
    }
}

#[tokio::test]
async fn succeeds_on_a_later_attempt() {
    let publisher = FlakyPublisher::new(2);
    let result =
        publish_with_retry(&publisher, Path::new("bundle"), "acct/repo", fast_policy(3)).await;

    assert!(result.is_ok());
    assert_eq!(publisher.upload_calls.load(Ordering::SeqCst), 3);
    // The repository is (re-)ensured on every attempt.
    assert_eq!(publisher.ensure_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn gives_up_after_the_attempt_budget() {
    let publisher = FlakyPublisher::new(10);
    let err = publish_with_retry(&publisher, Path::new("bundle"), "acct/repo", fast_policy(3))
        .await
        .unwrap_err();

    assert_eq!(err, PublishError::Upload("transient network error".to_string()));
    assert_eq!(publisher.upload_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn zero_attempts_is_clamped_to_one() {
    let publisher = FlakyPublisher::new(0);
    let result =
        publish_with_retry(&publisher, Path::new("bundle"), "acct/repo", fast_policy(0)).await;

    assert!(result.is_ok());
    assert_eq!(publisher.upload_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn dry_run_publisher_always_succeeds() {
    let result = publish_with_retry(
        &DryRunPublisher,
        Path::new("data/source/clean/audio"),
        "dry-run/source-audio",
        RetryPolicy::default(),
    )
    .await;
    assert!(result.is_ok());
}
