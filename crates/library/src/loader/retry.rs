use forge_config::RetryConfig;
use forge_storage::error::Result;
use std::future::Future;

/// Run `op` until it succeeds, fails with a non-retryable error, or runs out
/// of attempts. The delay starts at the configured backoff and doubles after
/// every failed attempt.
pub(crate) async fn with_retry<T, F, Fut>(policy: &RetryConfig, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt: u32 = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < policy.attempts && err.is_retryable() => {
                let delay = policy.backoff().saturating_mul(2u32.saturating_pow(attempt - 1));
                tracing::debug!(attempt, ?delay, error = ?err, "Retrying after failure");
                tokio::time::sleep(delay).await;
                attempt += 1;
            },
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_storage::error::ErrorKind;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tokio::time::Instant;

    const POLICY: RetryConfig = RetryConfig {
        attempts: 3,
        backoff_ms: 100,
    };

    #[tokio::test(start_paused = true)]
    async fn test_backoff_doubles() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let started = Instant::now();
        let result = with_retry(&POLICY, || async move {
            match counter.fetch_add(1, Ordering::SeqCst) {
                0 | 1 => Err(exn::Exn::from(ErrorKind::Network("reset".to_string()))),
                _ => Ok("listed"),
            }
        })
        .await;
        assert_eq!(result.unwrap(), "listed");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(started.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_attempts() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<()> = with_retry(&POLICY, || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(exn::Exn::from(ErrorKind::Network("reset".to_string())))
        })
        .await;
        assert!(matches!(&*result.unwrap_err(), ErrorKind::Network(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<()> = with_retry(&POLICY, || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(exn::Exn::from(ErrorKind::PermissionDenied(PathBuf::from("icons"))))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
