use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

use nsrep_types::StoreResult;

/// How long to keep trying to reach a backend at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one.
    pub retries: u32,
    /// Wait before the first retry; doubled after every failure.
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 6,
            initial_delay: Duration::from_secs(1),
        }
    }
}

/// Run `factory` until it yields a store or the policy is exhausted.
///
/// The last error is returned when every attempt fails.
pub async fn connect_with_retry<T, F, Fut>(
    name: &str,
    policy: RetryPolicy,
    mut factory: F,
) -> StoreResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = StoreResult<T>>,
{
    let mut delay = policy.initial_delay;
    let mut attempt = 0u32;
    loop {
        match factory().await {
            Ok(store) => {
                info!(store = name, attempt, "store connected");
                return Ok(store);
            }
            Err(e) if attempt < policy.retries => {
                warn!(store = name, attempt, error = %e, delay_ms = delay.as_millis() as u64, "store not ready, retrying");
                tokio::time::sleep(delay).await;
                delay = delay.saturating_mul(2);
                attempt += 1;
            }
            Err(e) => {
                warn!(store = name, attempt, error = %e, "giving up on store");
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use nsrep_types::StoreError;

    fn fast(retries: u32) -> RetryPolicy {
        RetryPolicy {
            retries,
            initial_delay: Duration::from_millis(1),
        }
    }

    #[test]
    fn default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.retries, 6);
        assert_eq!(policy.initial_delay, Duration::from_secs(1));
    }

    #[tokio::test]
    async fn succeeds_after_failures() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let value = connect_with_retry("primary", fast(3), move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(StoreError::Creation("not yet".into()))
            } else {
                Ok(42)
            }
        })
        .await
        .unwrap();
        assert_eq!(value, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_with_last_error() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let err = connect_with_retry::<(), _, _>("secondary", fast(2), move || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Creation(format!("attempt {n}")))
        })
        .await
        .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(err, StoreError::Creation("attempt 2".into()));
    }
}
