use crate::config::ConnectRetryConfig;
use crate::error::FulfillmentError;
use sorting_robot::RobotError;
use std::future::Future;
use tracing::{info, warn};

/// Calls `connect` until it succeeds or `retry.max_attempts` is used up, sleeping with
/// exponential backoff in between. `connect` receives the 1-based attempt number.
///
/// # Errors
/// [`FulfillmentError::StartupFailed`] carrying the last robot error.
pub async fn connect_with_backoff<R, F, Fut>(
    retry: &ConnectRetryConfig,
    mut connect: F,
) -> Result<R, FulfillmentError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<R, RobotError>>,
{
    let max_attempts = retry.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match connect(attempt).await {
            Ok(robot) => {
                info!(attempt, "Robot connected");
                return Ok(robot);
            }
            Err(last_error) if attempt >= max_attempts => {
                return Err(FulfillmentError::StartupFailed {
                    attempts: attempt,
                    last_error,
                });
            }
            Err(e) => {
                let delay = retry.delay_for_attempt(attempt);
                warn!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Robot connection failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn fast_retry(max_attempts: u32) -> ConnectRetryConfig {
        ConnectRetryConfig {
            max_attempts,
            initial_delay_ms: 1,
            max_delay_ms: 5,
            multiplier: 2.0,
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = connect_with_backoff(&fast_retry(5), |attempt| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 3 {
                    Err(RobotError::Transport("connection refused".into()))
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let result: Result<(), _> = connect_with_backoff(&fast_retry(3), |_| async {
            Err(RobotError::Transport("connection refused".into()))
        })
        .await;

        assert_eq!(
            result,
            Err(FulfillmentError::StartupFailed {
                attempts: 3,
                last_error: RobotError::Transport("connection refused".into()),
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_between_attempts() {
        let retry = ConnectRetryConfig {
            max_attempts: 3,
            initial_delay_ms: 100,
            max_delay_ms: 1_000,
            multiplier: 2.0,
        };
        let started = tokio::time::Instant::now();

        let _: Result<(), _> = connect_with_backoff(&retry, |_| async {
            Err(RobotError::ActorClosed)
        })
        .await;

        // 100 ms after the first failure, 200 ms after the second, none after the last
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(300), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(400), "{elapsed:?}");
    }
}
