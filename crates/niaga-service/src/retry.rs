//! Bounded re-execution of a write transaction.
//!
//! ```text
//! attempt 1 ── StaleWrite ──► rollback ──► attempt 2 ── Ok ──► return
//!                                              │
//!                     InsufficientStock ───────┴──► return at once
//! ```
//!
//! Only storage races are retried. Business failures end the loop on the
//! attempt that produced them. Attempts are spaced by a jittered,
//! exponentially growing pause so that racing writers spread out.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use crate::error::ApiError;
use niaga_core::CoreError;
use niaga_db::DbError;

/// Pause after the first lost race; doubles per attempt.
const BACKOFF_BASE_MS: u64 = 10;
const BACKOFF_CAP_MS: u64 = 250;

/// Outcome of one failed attempt.
#[derive(Debug)]
pub(crate) enum AttemptError {
    /// The transaction lost a race. Running it again may succeed.
    Retry(DbError),
    /// Report to the caller as is.
    Fatal(ApiError),
}

impl From<DbError> for AttemptError {
    fn from(err: DbError) -> Self {
        if err.is_retryable() {
            AttemptError::Retry(err)
        } else {
            AttemptError::Fatal(err.into())
        }
    }
}

impl From<CoreError> for AttemptError {
    fn from(err: CoreError) -> Self {
        AttemptError::Fatal(err.into())
    }
}

impl From<ApiError> for AttemptError {
    fn from(err: ApiError) -> Self {
        AttemptError::Fatal(err)
    }
}

/// Runs `attempt` until it succeeds, fails fatally, or `max_attempts` runs
/// have all lost a race. The last race is then reported as the caller's
/// error (`CONFLICT`).
pub(crate) async fn with_retry<T, F, Fut>(
    operation: &'static str,
    max_attempts: u32,
    mut attempt: F,
) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AttemptError>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt_no = 1;

    loop {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(AttemptError::Fatal(err)) => return Err(err),
            Err(AttemptError::Retry(err)) if attempt_no >= max_attempts => {
                warn!(operation, attempts = attempt_no, error = %err, "Giving up after write conflicts");
                return Err(err.into());
            }
            Err(AttemptError::Retry(err)) => {
                let pause = backoff(attempt_no);
                warn!(
                    operation,
                    attempt = attempt_no,
                    pause_ms = pause.as_millis() as u64,
                    error = %err,
                    "Write conflict, retrying"
                );
                attempt_no += 1;
                tokio::time::sleep(pause).await;
            }
        }
    }
}

/// Random pause in `[ceiling/2, ceiling]`, where the ceiling doubles from
/// `BACKOFF_BASE_MS` each attempt up to `BACKOFF_CAP_MS`.
fn backoff(attempt_no: u32) -> Duration {
    let ceiling = BACKOFF_BASE_MS
        .saturating_mul(1u64 << attempt_no.min(16))
        .min(BACKOFF_CAP_MS);
    let millis = rand::thread_rng().gen_range(ceiling / 2..=ceiling);
    Duration::from_millis(millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_retries_until_success() {
        let calls = AtomicU32::new(0);
        let calls = &calls;

        let result = with_retry("test", 5, move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(AttemptError::from(DbError::stale("Item", "a")))
            } else {
                Ok(42)
            }
        })
        .await;

        assert_eq!(result, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_with_conflict() {
        let calls = AtomicU32::new(0);
        let calls = &calls;

        let result: Result<(), ApiError> = with_retry("test", 3, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(AttemptError::from(DbError::Busy("database is locked".to_string())))
        })
        .await;

        assert_eq!(result.unwrap_err().code, ErrorCode::Conflict);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_fatal_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let calls = &calls;

        let result: Result<(), ApiError> = with_retry("test", 5, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(AttemptError::from(CoreError::ItemNotFound("a".to_string())))
        })
        .await;

        assert_eq!(result.unwrap_err().code, ErrorCode::NotFound);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_backoff_grows_and_is_capped() {
        for _ in 0..50 {
            let first = backoff(1);
            assert!(first >= Duration::from_millis(10) && first <= Duration::from_millis(20));

            let third = backoff(3);
            assert!(third >= Duration::from_millis(40) && third <= Duration::from_millis(80));

            let late = backoff(30);
            assert!(late >= Duration::from_millis(125) && late <= Duration::from_millis(250));
        }
    }
}
