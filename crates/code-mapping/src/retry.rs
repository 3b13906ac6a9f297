//! Exponential backoff retry.
//!
//! [`ExponentialBackoffRetry`] re-runs an operation while a caller-supplied
//! predicate says its result is not good enough yet, waiting between
//! attempts. The wait doubles after each attempt and is clamped to the
//! configured maximum, so the n-th wait is `min(initial * 2^(n-1), max)`.
//!
//! Waiting goes through the [`Sleeper`] capability. The default sleeper is a
//! [`CancellationToken`], which lets another thread abort a pending wait; the
//! retry call then fails with [`RetryInterrupted`].
//!
//! # Example
//!
//! ```rust
//! use code_mapping::{CancellationToken, CodeMappingError, ExponentialBackoffRetry, RetryConfig};
//! use std::time::Duration;
//!
//! let retry = ExponentialBackoffRetry::with_cancellation(
//!     RetryConfig {
//!         initial_delay: Duration::from_millis(1),
//!         max_delay: Duration::from_millis(4),
//!         max_attempts: Some(3),
//!     },
//!     CancellationToken::new(),
//! );
//!
//! let mut calls = 0;
//! let result = retry.execute_with_retry(
//!     "example",
//!     || {
//!         calls += 1;
//!         Ok::<_, CodeMappingError>(calls)
//!     },
//!     |calls| *calls < 3,
//! );
//! assert_eq!(result.unwrap(), 3);
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{info, warn};

use crate::config::RetryConfig;
use crate::error::RetryInterrupted;

/// Blocking wait between two retry attempts.
pub trait Sleeper: Send + Sync {
    /// Blocks for `delay`, or fails early if the wait was interrupted.
    fn sleep(&self, delay: Duration) -> Result<(), RetryInterrupted>;
}

/// Cloneable cancellation signal that doubles as an interruptible [`Sleeper`].
///
/// Once cancelled, a token stays cancelled: every pending and future wait on
/// it returns [`RetryInterrupted`] immediately.
#[derive(Clone, Default)]
pub struct CancellationToken {
    inner: Arc<TokenState>,
}

#[derive(Default)]
struct TokenState {
    cancelled: Mutex<bool>,
    wakeup: Condvar,
}

impl CancellationToken {
    /// Creates a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels the token and wakes every thread waiting on it.
    pub fn cancel(&self) {
        let mut cancelled = self.inner.cancelled.lock();
        *cancelled = true;
        self.inner.wakeup.notify_all();
    }

    /// Returns true once [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        *self.inner.cancelled.lock()
    }
}

impl fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

impl Sleeper for CancellationToken {
    fn sleep(&self, delay: Duration) -> Result<(), RetryInterrupted> {
        let mut cancelled = self.inner.cancelled.lock();
        match Instant::now().checked_add(delay) {
            Some(deadline) => {
                while !*cancelled {
                    if self
                        .inner
                        .wakeup
                        .wait_until(&mut cancelled, deadline)
                        .timed_out()
                    {
                        break;
                    }
                }
            }
            // Deadline not representable: wait for cancellation only.
            None => {
                while !*cancelled {
                    self.inner.wakeup.wait(&mut cancelled);
                }
            }
        }

        if *cancelled {
            Err(RetryInterrupted)
        } else {
            Ok(())
        }
    }
}

/// Retry executor with exponential backoff, a delay cap and an optional
/// attempt limit.
pub struct ExponentialBackoffRetry {
    config: RetryConfig,
    sleeper: Arc<dyn Sleeper>,
}

impl ExponentialBackoffRetry {
    /// Creates a retry executor with its own, never cancelled token.
    pub fn new(config: RetryConfig) -> Self {
        Self::with_cancellation(config, CancellationToken::new())
    }

    /// Creates a retry executor whose waits are aborted by `token`.
    pub fn with_cancellation(config: RetryConfig, token: CancellationToken) -> Self {
        Self::with_sleeper(config, token)
    }

    /// Creates a retry executor with a custom wait implementation.
    pub fn with_sleeper(config: RetryConfig, sleeper: impl Sleeper + 'static) -> Self {
        Self {
            config,
            sleeper: Arc::new(sleeper),
        }
    }

    /// Returns the backoff configuration.
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Runs `operation` until `should_retry` rejects its result.
    ///
    /// The first attempt is never delayed. When `max_attempts` is configured
    /// and used up, the last result is returned as-is; exhaustion is logged,
    /// not reported as an error.
    ///
    /// # Errors
    ///
    /// An `Err` from `operation` is returned immediately without retrying.
    /// An interrupted wait is returned as `E::from(RetryInterrupted)`.
    pub fn execute_with_retry<T, E, F, P>(
        &self,
        operation_name: &str,
        mut operation: F,
        should_retry: P,
    ) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
        P: Fn(&T) -> bool,
        E: From<RetryInterrupted>,
    {
        let mut result = operation()?;
        if !should_retry(&result) {
            return Ok(result);
        }

        let mut current_delay = self.config.initial_delay;
        let mut attempt: u32 = 1;
        while should_retry(&result) {
            if let Some(max_attempts) = self.config.max_attempts {
                if attempt > max_attempts {
                    warn!(
                        operation = operation_name,
                        max_attempts, "Max retry attempts reached - returning last result"
                    );
                    return Ok(result);
                }
            }

            info!(
                operation = operation_name,
                attempt,
                delay = ?current_delay,
                "Retrying after backoff"
            );
            self.sleeper.sleep(current_delay)?;
            result = operation()?;
            current_delay = next_delay(current_delay, self.config.max_delay);
            attempt = attempt.saturating_add(1);
        }

        Ok(result)
    }
}

impl fmt::Debug for ExponentialBackoffRetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExponentialBackoffRetry")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Doubles `current`, clamped to `max_delay`.
///
/// A delay already at or above `max_delay` is kept as-is.
pub fn next_delay(current: Duration, max_delay: Duration) -> Duration {
    if current >= max_delay {
        current
    } else {
        current.saturating_mul(2).min(max_delay)
    }
}
