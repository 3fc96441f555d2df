use crate::errors::{HarnessError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Re-run `check` until it reports `true` or `timeout` passes.
///
/// Errors from `check` end the wait immediately; only a `false` answer is
/// polled again. `what` names the awaited condition in the timeout error.
pub async fn poll_until_true<F, Fut>(
    what: &str,
    mut check: F,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let start_time = Instant::now();

    loop {
        if check().await? {
            return Ok(());
        }

        let elapsed = start_time.elapsed();
        if elapsed >= timeout {
            return Err(HarnessError::timeout(what, timeout));
        }

        tokio::time::sleep(poll_interval.min(timeout - elapsed)).await;
    }
}
