//! Restart loop for the long-running bot task.

use std::future::Future;
use std::time::Duration;

use tracing::{error, info, warn};

/// Longest pause between two restarts.
pub const MAX_BACKOFF: Duration = Duration::from_secs(300);

/// Delay before restart number `attempt` (1-based): `base * 2^(attempt-1)`,
/// capped at [`MAX_BACKOFF`].
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    base.saturating_mul(factor).min(MAX_BACKOFF)
}

/// Run `task` until it succeeds or `max_attempts` runs have failed.
///
/// Returns the last error once attempts are exhausted.
pub async fn run_supervised<F, Fut>(
    max_attempts: u32,
    base_delay: Duration,
    mut task: F,
) -> anyhow::Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match task().await {
            Ok(()) => return Ok(()),
            Err(e) if attempt >= max_attempts => {
                error!("Giving up after {} attempts: {:#}", attempt, e);
                return Err(e);
            }
            Err(e) => {
                let delay = backoff_delay(base_delay, attempt);
                warn!(
                    "Attempt {}/{} failed: {:#}. Restarting in {:?}",
                    attempt, max_attempts, e, delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
                info!("Restart attempt {}/{}", attempt, max_attempts);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_backoff_schedule() {
        let base = Duration::from_secs(5);
        let delays: Vec<u64> = (1..=8).map(|n| backoff_delay(base, n).as_secs()).collect();
        assert_eq!(delays, vec![5, 10, 20, 40, 80, 160, 300, 300]);
        assert_eq!(backoff_delay(base, 0), base);
        assert_eq!(backoff_delay(base, 64), MAX_BACKOFF);
    }

    #[tokio::test]
    async fn test_recovers_after_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = run_supervised(5, Duration::from_millis(1), move || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    anyhow::bail!("network is unreachable");
                }
                Ok(())
            }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_with_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = run_supervised(3, Duration::from_millis(1), move || {
            let counter = counter.clone();
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                anyhow::bail!("failure {}", n)
            }
        })
        .await;

        assert_eq!(result.unwrap_err().to_string(), "failure 3");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
