//! [`Deadline`] – per-request timeout linked to the loop's cancellation.
//!
//! The request timeout and the loop's stop signal are two independent
//! sources.  A [`Deadline`] holds a *child* of the loop token plus its own
//! timeout: stopping the loop trips every outstanding deadline, while a
//! deadline timing out leaves the loop token untouched.

use std::future::Future;
use std::time::Duration;

use aerollm_types::{CancelReason, PilotError};
use tokio_util::sync::CancellationToken;

/// Cancellation point for a single request.
#[derive(Debug, Clone)]
pub struct Deadline {
    timeout: Duration,
    cancel: CancellationToken,
}

impl Deadline {
    /// Create a deadline that expires after `timeout` or when `parent` is
    /// cancelled, whichever comes first.
    pub fn new(timeout: Duration, parent: &CancellationToken) -> Self {
        Self {
            timeout,
            cancel: parent.child_token(),
        }
    }

    /// Create a deadline governed only by `timeout`.
    pub fn after(timeout: Duration) -> Self {
        Self {
            timeout,
            cancel: CancellationToken::new(),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The token that trips when the parent is cancelled.
    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Drive `fut` to completion unless the deadline fires first.
    ///
    /// When the deadline fires `fut` is dropped, which aborts any I/O it had
    /// in flight.
    ///
    /// # Errors
    ///
    /// Returns whatever `fut` returns, or [`PilotError::Cancelled`] with
    /// [`CancelReason::Stopped`] / [`CancelReason::Timeout`].
    pub async fn run<T, F>(&self, fut: F) -> Result<T, PilotError>
    where
        F: Future<Output = Result<T, PilotError>>,
    {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(PilotError::Cancelled(CancelReason::Stopped)),
            () = tokio::time::sleep(self.timeout) => Err(PilotError::Cancelled(CancelReason::Timeout)),
            result = fut => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn completes_when_future_is_fast() {
        let deadline = Deadline::after(Duration::from_secs(5));
        let value = deadline.run(async { Ok::<_, PilotError>(42) }).await.unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn passes_through_inner_errors() {
        let deadline = Deadline::after(Duration::from_secs(5));
        let result: Result<(), _> = deadline.run(async { Err(PilotError::Extraction) }).await;
        assert!(matches!(result, Err(PilotError::Extraction)));
    }

    #[tokio::test]
    async fn timeout_fires_for_slow_future() {
        let deadline = Deadline::after(Duration::from_millis(20));
        let result: Result<(), _> = deadline.run(std::future::pending()).await;
        assert!(matches!(result, Err(PilotError::Cancelled(CancelReason::Timeout))));
    }

    #[tokio::test]
    async fn parent_cancellation_trips_deadline_promptly() {
        let parent = CancellationToken::new();
        let deadline = Deadline::new(Duration::from_secs(30), &parent);
        let trigger = parent.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });
        let started = Instant::now();
        let result: Result<(), _> = deadline.run(std::future::pending()).await;
        assert!(matches!(result, Err(PilotError::Cancelled(CancelReason::Stopped))));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn timeout_does_not_cancel_parent() {
        let parent = CancellationToken::new();
        let deadline = Deadline::new(Duration::from_millis(10), &parent);
        let _: Result<(), _> = deadline.run(std::future::pending()).await;
        assert!(!parent.is_cancelled());
    }

    #[test]
    fn already_cancelled_parent_yields_cancelled_child() {
        let parent = CancellationToken::new();
        parent.cancel();
        let deadline = Deadline::new(Duration::from_secs(1), &parent);
        assert!(deadline.token().is_cancelled());
    }
}
