//! Exponential backoff retry.
//!
//! The policy never decides which failures are worth retrying. It retries
//! every `Err` the operation returns; callers that must not retry a class of
//! failure return it inside `Ok` and unpack it afterwards.

use crate::clock::{Clock, SystemClock};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Per-call retry bookkeeping. Lives for one `execute` call only.
struct RetryContext<E> {
    attempt: u32,
    delay: Duration,
    last_failure: Option<E>,
}

impl<E> RetryContext<E> {
    fn new(initial_delay: Duration) -> Self {
        Self {
            attempt: 0,
            delay: initial_delay,
            last_failure: None,
        }
    }
}

/// Retry scheduler with delays `d, 2d, 4d, ...` and a bounded attempt count.
///
/// Stateless between calls, so one instance can serve any number of
/// independent operations.
#[derive(Clone)]
pub struct BackoffPolicy {
    clock: Arc<dyn Clock>,
}

impl BackoffPolicy {
    /// Create a policy that sleeps on the given clock.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Run `operation` until it succeeds or `max_attempts` attempts fail.
    ///
    /// Between attempts the policy sleeps for the current delay and then
    /// doubles it, starting at `initial_delay`. There is no sleep after the
    /// final attempt. The last failure is returned as produced, unwrapped.
    /// A `max_attempts` of zero is treated as one.
    pub fn execute<T, E, F>(
        &self,
        mut operation: F,
        max_attempts: u32,
        initial_delay: Duration,
    ) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
        E: fmt::Display,
    {
        let max_attempts = max_attempts.max(1);
        let mut ctx = RetryContext::new(initial_delay);

        while ctx.attempt < max_attempts {
            if ctx.attempt > 0 {
                self.clock.sleep(ctx.delay);
                ctx.delay = ctx.delay.saturating_mul(2);
            }
            ctx.attempt += 1;

            match operation() {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if ctx.attempt < max_attempts {
                        tracing::warn!(
                            attempt = ctx.attempt,
                            max_attempts,
                            delay_ms = ctx.delay.as_millis() as u64,
                            error = %err,
                            "attempt failed, backing off"
                        );
                    } else {
                        tracing::debug!(attempts = ctx.attempt, error = %err, "retry budget exhausted");
                    }
                    ctx.last_failure = Some(err);
                }
            }
        }

        match ctx.last_failure {
            Some(err) => Err(err),
            None => unreachable!("at least one attempt always runs"),
        }
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl fmt::Debug for BackoffPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackoffPolicy").finish_non_exhaustive()
    }
}
