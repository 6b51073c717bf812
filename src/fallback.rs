//! Ordered fallback between a primary algorithm and a simpler one, and the
//! deadline both of them observe.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::warn;

use crate::error::{OperationError, Result};

/// Which stage of a fallback chain produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    Primary,
    Fallback,
}

/// A successful result together with the stage that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Attempt<T> {
    pub value: T,
    pub provenance: Provenance,
    /// Message of the primary failure when the fallback ran.
    pub primary_error: Option<String>,
}

/// Runs `primary`, and `fallback` if the primary fails recoverably.
///
/// # Errors
///
/// Returns the primary error unchanged if it is not recoverable (timeouts,
/// cancellation), and the fallback error if both stages fail.
pub fn with_fallback<T, P, F>(primary: P, fallback: F) -> Result<Attempt<T>>
where
    P: FnOnce() -> Result<T>,
    F: FnOnce() -> Result<T>,
{
    match primary() {
        Ok(value) => Ok(Attempt {
            value,
            provenance: Provenance::Primary,
            primary_error: None,
        }),
        Err(err) if err.is_recoverable() => {
            warn!(error = %err, "primary stage failed, running fallback");
            let value = fallback()?;
            Ok(Attempt {
                value,
                provenance: Provenance::Fallback,
                primary_error: Some(err.to_string()),
            })
        }
        Err(err) => Err(err),
    }
}

/// Deadline and cancellation token checked inside long-running loops.
#[derive(Debug, Clone)]
pub struct Deadline {
    started: Instant,
    expires: Option<Instant>,
    generation: Option<(Arc<AtomicU64>, u64)>,
}

impl Default for Deadline {
    fn default() -> Self {
        Self::none()
    }
}

impl Deadline {
    /// Never expires.
    #[must_use]
    pub fn none() -> Self {
        Self {
            started: Instant::now(),
            expires: None,
            generation: None,
        }
    }

    /// Expires `timeout` from now.
    #[must_use]
    pub fn after(timeout: Duration) -> Self {
        let started = Instant::now();
        Self {
            started,
            expires: started.checked_add(timeout),
            generation: None,
        }
    }

    /// Also cancels once `counter` moves past `generation`.
    #[must_use]
    pub fn with_generation(mut self, counter: Arc<AtomicU64>, generation: u64) -> Self {
        self.generation = Some((counter, generation));
        self
    }

    #[must_use]
    pub fn expires_at(&self) -> Option<Instant> {
        self.expires
    }

    /// # Errors
    ///
    /// Returns `OperationError::Cancelled` if a newer job superseded this
    /// one, or `OperationError::DeadlineExceeded` once the deadline passed.
    pub fn check(&self) -> Result<()> {
        if let Some((counter, generation)) = &self.generation {
            if counter.load(Ordering::Acquire) != *generation {
                return Err(OperationError::Cancelled.into());
            }
        }
        if let Some(expires) = self.expires {
            let now = Instant::now();
            if now >= expires {
                return Err(OperationError::DeadlineExceeded {
                    elapsed: now.duration_since(self.started),
                }
                .into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::{GeometryError, RtGeomError};

    #[test]
    fn primary_success_skips_fallback() {
        let attempt = with_fallback(|| Ok(1), || -> Result<i32> { panic!("not called") }).unwrap();
        assert_eq!(attempt.value, 1);
        assert_eq!(attempt.provenance, Provenance::Primary);
    }

    #[test]
    fn recoverable_failure_runs_fallback() {
        let attempt = with_fallback(
            || -> Result<i32> { Err(GeometryError::Degenerate("spike".into()).into()) },
            || Ok(2),
        )
        .unwrap();
        assert_eq!(attempt.value, 2);
        assert_eq!(attempt.provenance, Provenance::Fallback);
        assert!(attempt.primary_error.unwrap().contains("spike"));
    }

    #[test]
    fn timeout_is_not_retried() {
        let result = with_fallback(
            || -> Result<i32> {
                Err(OperationError::DeadlineExceeded {
                    elapsed: Duration::from_secs(30),
                }
                .into())
            },
            || -> Result<i32> { panic!("not called") },
        );
        assert!(matches!(
            result,
            Err(RtGeomError::Operation(OperationError::DeadlineExceeded { .. }))
        ));
    }

    #[test]
    fn both_stages_failing_reports_fallback_error() {
        let result = with_fallback(
            || -> Result<i32> { Err(OperationError::Failed("a".into()).into()) },
            || -> Result<i32> { Err(OperationError::Failed("b".into()).into()) },
        );
        assert_eq!(result.unwrap_err().to_string(), "operation failed: b");
    }

    #[test]
    fn deadline_expiry_and_cancellation() {
        assert!(Deadline::none().check().is_ok());
        assert!(Deadline::after(Duration::ZERO).check().is_err());

        let counter = Arc::new(AtomicU64::new(3));
        let d = Deadline::after(Duration::from_secs(60)).with_generation(counter.clone(), 3);
        assert!(d.check().is_ok());
        counter.store(4, Ordering::Release);
        assert!(matches!(
            d.check(),
            Err(RtGeomError::Operation(OperationError::Cancelled))
        ));
    }
}
