//! Bounded retry on a fixed interval.

use crate::errors::{HarnessError, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub interval_ms: u64,
    pub attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            interval_ms: 500,
            attempts: 20,
        }
    }
}

impl RetryPolicy {
    pub fn new(interval_ms: u64, attempts: u32) -> Self {
        Self {
            interval_ms,
            attempts,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Start `probe` on every interval tick until one attempt succeeds.
///
/// The first attempt starts one interval after the call. Attempts are not
/// serialized: a probe slower than the interval keeps running while later
/// attempts start, and whichever succeeds first wins. On the tick after the
/// last attempt the call fails with the most recent failure seen so far;
/// attempts still pending at that point are dropped.
pub async fn retry<F, Fut, T>(mut probe: F, policy: RetryPolicy) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let interval = policy.interval();
    let mut ticker = time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut in_flight = FuturesUnordered::new();
    let mut started: u32 = 0;
    let mut last_error: Option<HarnessError> = None;

    loop {
        tokio::select! {
            biased;

            Some(outcome) = in_flight.next(), if !in_flight.is_empty() => match outcome {
                Ok(value) => {
                    debug!(attempts = started, "probe succeeded");
                    return Ok(value);
                }
                Err(err) => {
                    debug!(attempts = started, error = %err, "probe failed");
                    last_error = Some(err);
                }
            },
            _ = ticker.tick() => {
                if started == policy.attempts {
                    return Err(last_error.unwrap_or(HarnessError::RetryExhausted {
                        attempts: policy.attempts,
                    }));
                }
                started += 1;
                in_flight.push(probe());
            }
        }
    }
}
