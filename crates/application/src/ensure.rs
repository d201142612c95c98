//! Existence-check-then-create state machine shared by every provisioned resource.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use loglake_core::{AppError, AppResult};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Observed state of a dependent platform resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceState {
    /// Resource does not exist or differs from the requested definition.
    Absent,
    /// Resource exists with the requested definition.
    Present,
}

/// Port for one kind of platform resource with "ensure present" semantics.
///
/// `create` may return [`AppError::Conflict`] when the resource appeared after the
/// state check; callers treat that as present.
#[async_trait]
pub trait EnsurePresent<R>: Send + Sync
where
    R: Sync,
{
    /// Looks up the current state of the resource.
    async fn state(&self, resource: &R) -> AppResult<ResourceState>;

    /// Creates the resource or replaces its definition.
    async fn create(&self, resource: &R) -> AppResult<()>;
}

/// Result of one idempotent provisioning step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    /// The step changed platform state.
    Created,
    /// The platform already matched the requested state.
    AlreadyPresent,
    /// The step does not apply to this resource.
    NotRequired,
}

impl StepOutcome {
    /// Returns a stable value for this outcome.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::AlreadyPresent => "already_present",
            Self::NotRequired => "not_required",
        }
    }
}

/// Bounded retry budget for transient platform errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u8,
    backoff_ms: u64,
}

impl RetryPolicy {
    /// Creates a retry policy; at least one attempt is always made.
    #[must_use]
    pub fn new(max_attempts: u8, backoff_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_ms,
        }
    }

    /// Policy that never retries.
    #[must_use]
    pub fn no_retry() -> Self {
        Self::new(1, 0)
    }

    /// Returns the attempt budget.
    #[must_use]
    pub fn max_attempts(&self) -> u8 {
        self.max_attempts
    }

    /// Returns the base delay between attempts.
    #[must_use]
    pub fn backoff_ms(&self) -> u64 {
        self.backoff_ms
    }

    /// Runs `operation`, retrying [`AppError::Transient`] failures with linear backoff.
    pub async fn run<F, Fut, T>(&self, operation_name: &str, mut operation: F) -> AppResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let mut attempt = 0_u8;

        loop {
            attempt = attempt.saturating_add(1);

            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_retryable() && attempt < self.max_attempts => {
                    let delay = self.backoff_ms.saturating_mul(u64::from(attempt));
                    warn!(
                        operation = operation_name,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay,
                        error = %error,
                        "transient platform error, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
                Err(error) if error.is_retryable() => {
                    return Err(error.context(format!(
                        "{operation_name} exhausted {} attempts",
                        self.max_attempts
                    )));
                }
                Err(error) => return Err(error),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, 500)
    }
}

/// Drives one resource from `Absent` to `Present`.
///
/// `Present` resources are left untouched, and a create call answered with
/// [`AppError::Conflict`] counts as `AlreadyPresent`.
pub async fn ensure_present<R>(
    port: &dyn EnsurePresent<R>,
    resource: &R,
    retry: &RetryPolicy,
) -> AppResult<StepOutcome>
where
    R: Display + Sync,
{
    let label = resource.to_string();
    let state = retry
        .run(&format!("look up {label}"), || port.state(resource))
        .await?;

    if state == ResourceState::Present {
        debug!(resource = %label, "resource already present");
        return Ok(StepOutcome::AlreadyPresent);
    }

    match retry
        .run(&format!("create {label}"), || port.create(resource))
        .await
    {
        Ok(()) => {
            info!(resource = %label, "resource created");
            Ok(StepOutcome::Created)
        }
        Err(AppError::Conflict(message)) => {
            debug!(resource = %label, reason = %message, "resource appeared concurrently");
            Ok(StepOutcome::AlreadyPresent)
        }
        Err(error) => Err(error),
    }
}

#[cfg(test)]
mod tests {
    use std::fmt::{Display, Formatter};

    use async_trait::async_trait;
    use loglake_core::{AppError, AppResult};
    use tokio::sync::Mutex;

    use super::{EnsurePresent, ResourceState, RetryPolicy, StepOutcome, ensure_present};

    struct Widget;

    impl Display for Widget {
        fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("widget")
        }
    }

    #[derive(Default)]
    struct FlakyPort {
        present: Mutex<bool>,
        transient_failures: Mutex<u8>,
        conflict_on_create: bool,
        create_calls: Mutex<u8>,
    }

    #[async_trait]
    impl EnsurePresent<Widget> for FlakyPort {
        async fn state(&self, _resource: &Widget) -> AppResult<ResourceState> {
            let mut failures = self.transient_failures.lock().await;
            if *failures > 0 {
                *failures -= 1;
                return Err(AppError::Transient("not yet visible".to_owned()));
            }

            Ok(if *self.present.lock().await {
                ResourceState::Present
            } else {
                ResourceState::Absent
            })
        }

        async fn create(&self, _resource: &Widget) -> AppResult<()> {
            *self.create_calls.lock().await += 1;
            if self.conflict_on_create {
                return Err(AppError::Conflict("widget already exists".to_owned()));
            }

            *self.present.lock().await = true;
            Ok(())
        }
    }

    #[tokio::test]
    async fn absent_resource_is_created_once() {
        let port = FlakyPort::default();
        let retry = RetryPolicy::new(3, 0);

        let first = ensure_present(&port, &Widget, &retry).await;
        let second = ensure_present(&port, &Widget, &retry).await;

        assert_eq!(first.ok(), Some(StepOutcome::Created));
        assert_eq!(second.ok(), Some(StepOutcome::AlreadyPresent));
        assert_eq!(*port.create_calls.lock().await, 1);
    }

    #[tokio::test]
    async fn conflict_on_create_counts_as_present() {
        let port = FlakyPort {
            conflict_on_create: true,
            ..FlakyPort::default()
        };

        let outcome = ensure_present(&port, &Widget, &RetryPolicy::no_retry()).await;
        assert_eq!(outcome.ok(), Some(StepOutcome::AlreadyPresent));
    }

    #[tokio::test]
    async fn transient_errors_are_retried_within_budget() {
        let port = FlakyPort::default();
        *port.transient_failures.lock().await = 2;

        let outcome = ensure_present(&port, &Widget, &RetryPolicy::new(3, 0)).await;
        assert_eq!(outcome.ok(), Some(StepOutcome::Created));
    }

    #[tokio::test]
    async fn exhausted_retries_surface_transient_error() {
        let port = FlakyPort::default();
        *port.transient_failures.lock().await = 5;

        let outcome = ensure_present(&port, &Widget, &RetryPolicy::new(2, 0)).await;
        assert!(matches!(outcome, Err(AppError::Transient(_))));
        assert_eq!(*port.create_calls.lock().await, 0);
    }
}
