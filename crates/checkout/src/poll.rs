//! Bounded polling for charges the gateway has not settled yet.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

/// How many times to re-query and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl PollPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 4;
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(2000);

    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS, Self::DEFAULT_DELAY)
    }
}

/// Waits between polls.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Re-runs `probe` until `is_settled` holds or the policy's attempts run out.
///
/// `initial` is checked first, so an already settled value costs no probe
/// and no sleep. Each probe is preceded by one `policy.delay` sleep. The
/// last value seen is returned even when it never settled; a failing probe
/// stops the loop and its error is returned.
pub async fn poll_until<T, E, S, P, Fut>(
    policy: PollPolicy,
    sleeper: &dyn Sleeper,
    initial: T,
    is_settled: S,
    mut probe: P,
) -> Result<T, E>
where
    S: Fn(&T) -> bool,
    P: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut current = initial;
    let mut attempts = 0;
    while !is_settled(&current) && attempts < policy.max_attempts {
        sleeper.sleep(policy.delay).await;
        attempts += 1;
        current = probe().await?;
    }
    Ok(current)
}
