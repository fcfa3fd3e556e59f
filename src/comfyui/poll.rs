//! Cooperative retry loop used to wait on ComfyUI's history endpoint.
//!
//! The clock is injected through [`Sleeper`] so tests run without real delays,
//! and the terminal-state decision belongs to the check closure.
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::AppResult;

#[derive(Clone, Debug)]
pub struct PollPolicy {
    pub interval: Duration,
    /// `None` keeps polling until the check reports a terminal state.
    pub max_attempts: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        PollPolicy {
            interval: Duration::from_secs(3),
            max_attempts: None,
        }
    }
}

#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug)]
pub enum PollState<T> {
    Pending,
    Ready(T),
}

/// Sleep, check, repeat. Returns `Ok(None)` once `max_attempts` checks came
/// back pending; check errors abort the loop immediately.
pub async fn poll_until<T, F, Fut>(
    policy: &PollPolicy,
    sleeper: &dyn Sleeper,
    mut check: F,
) -> AppResult<Option<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = AppResult<PollState<T>>>,
{
    let mut attempt: u32 = 0;
    loop {
        if let Some(max) = policy.max_attempts {
            if attempt >= max {
                return Ok(None);
            }
        }
        sleeper.sleep(policy.interval).await;
        attempt += 1;
        match check(attempt).await? {
            PollState::Ready(value) => return Ok(Some(value)),
            PollState::Pending => {
                tracing::trace!(attempt, "Still waiting");
            }
        }
    }
}
