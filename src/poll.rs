use crate::mailchimp::error::ApiError;
use rand::Rng;
use std::future::Future;
use std::time::{Duration, Instant};

/// Exponential backoff for waiting on a read to reflect an earlier write.
#[derive(Debug, Clone)]
pub struct PollPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
    pub max_elapsed: Duration,
    pub jitter: f64,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            multiplier: 2.0,
            max_elapsed: Duration::from_secs(120),
            jitter: 0.2,
        }
    }
}

impl PollPolicy {
    /// Delay to use after `delay`, capped at `max_delay`.
    pub fn next_delay(&self, delay: Duration) -> Duration {
        Duration::try_from_secs_f64(delay.as_secs_f64() * self.multiplier)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    fn jittered(&self, delay: Duration) -> Duration {
        if self.jitter <= 0.0 {
            return delay;
        }
        let extra = rand::thread_rng().gen_range(0.0..=self.jitter);
        delay + delay.mul_f64(extra)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error("condition not met after {attempts} attempts in {elapsed:?}")]
    TimedOut { attempts: u32, elapsed: Duration },

    #[error("poll aborted on attempt {attempt}")]
    Api {
        attempt: u32,
        #[source]
        source: ApiError,
    },
}

/// Call `check` until it reports `true`, returning the number of attempts made.
///
/// `Ok(false)` and retryable API errors are retried with backoff. Any other
/// error stops the wait immediately. Running past `max_elapsed`, including
/// while an attempt is still in flight, yields [`PollError::TimedOut`].
pub async fn wait_until<F, Fut>(policy: &PollPolicy, mut check: F) -> Result<u32, PollError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, ApiError>>,
{
    let start = Instant::now();
    let mut delay = policy.initial_delay;
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        let remaining = policy.max_elapsed.saturating_sub(start.elapsed());
        let outcome = match tokio::time::timeout(remaining, check()).await {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::warn!(attempt, "poll attempt cut off by the time budget");
                return Err(PollError::TimedOut {
                    attempts: attempt,
                    elapsed: start.elapsed(),
                });
            }
        };
        match outcome {
            Ok(true) => return Ok(attempt),
            Ok(false) => {
                tracing::debug!(attempt, "condition not met yet");
            }
            Err(e) if e.is_retryable() => {
                tracing::warn!(attempt, error = %e, "retryable error while polling");
            }
            Err(source) => return Err(PollError::Api { attempt, source }),
        }

        let elapsed = start.elapsed();
        if elapsed >= policy.max_elapsed {
            return Err(PollError::TimedOut { attempts: attempt, elapsed });
        }

        let sleep_for = policy.jittered(delay).min(policy.max_elapsed - elapsed);
        tokio::time::sleep(sleep_for).await;
        delay = policy.next_delay(delay);
    }
}
