//! Cancellation-aware suspension points.
//!
//! Every navigation, selector wait and delay races the caller's
//! [`CancellationToken`] so that a cancelled request stops at the next
//! await instead of running to completion.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::{AgentError, Result};

/// Run `fut` unless `cancel` fires first.
pub async fn until_cancelled<T, F>(cancel: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AgentError::Cancelled),
        result = fut => result,
    }
}

/// Interruptible sleep.
pub async fn pause(cancel: &CancellationToken, delay: Duration) -> Result<()> {
    ensure_active(cancel)?;
    if delay.is_zero() {
        return Ok(());
    }
    until_cancelled(cancel, async {
        tokio::time::sleep(delay).await;
        Ok(())
    })
    .await
}

pub fn ensure_active(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        Err(AgentError::Cancelled)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_until_cancelled_passes_result_through() {
        let cancel = CancellationToken::new();
        let value = until_cancelled(&cancel, async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = until_cancelled(&cancel, async { Ok(1) }).await;
        assert!(matches!(result, Err(AgentError::Cancelled)));
        assert!(pause(&cancel, Duration::ZERO).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_is_interruptible() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let started = tokio::time::Instant::now();
        let result = pause(&cancel, Duration::from_secs(3600)).await;
        assert!(matches!(result, Err(AgentError::Cancelled)));
        assert!(started.elapsed() < Duration::from_secs(3600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_completes() {
        let cancel = CancellationToken::new();
        assert!(pause(&cancel, Duration::from_secs(5)).await.is_ok());
    }
}
