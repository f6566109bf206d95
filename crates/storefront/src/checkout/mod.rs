//! Idempotent order submission.
//!
//! A [`CheckoutAttempt`] is one logical checkout: the user pressed "order" or
//! "pay". It mints an [`IdempotencyKey`] when it begins and sends that same
//! key on every retry, so the backend can collapse duplicate deliveries of
//! the same request into one order. A new checkout action always begins a
//! new attempt, and therefore gets a new key.
//!
//! ```text
//! Idle ──submit──▶ Submitting ──▶ Succeeded
//!                      │
//!                      ▼
//!                   Failed ──retry (transient or unconfirmed, same key)──▶ Submitting
//!                      │
//!                      └──revise (permanent only, new payload, new key)──▶ Idle
//! ```
//!
//! An attempt can also [`resume`](CheckoutAttempt::resume) under a key taken
//! from an earlier run, so a retry survives a restart of the program.

mod retry;
mod submission;

use blossom_core::IdempotencyKey;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::client::ApiClient;
use crate::error::{ApiError, FailureKind};
use crate::types::Order;

pub use retry::RetryPolicy;
pub use submission::{CartOrder, DirectOrder, Payment, Submission};

// =============================================================================
// State
// =============================================================================

/// Where a checkout attempt currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutState {
    /// Nothing sent yet (or the last try was rejected locally).
    Idle,
    /// A request is in flight; the submit control should be disabled.
    Submitting,
    /// The backend accepted the order. Terminal.
    Succeeded(Order),
    /// The last try failed.
    Failed {
        failure: SubmissionFailure,
    },
}

impl CheckoutState {
    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        matches!(self, Self::Submitting)
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    /// What to show the user for a failed attempt.
    #[must_use]
    pub fn prompt(&self) -> Option<RetryPrompt> {
        match self {
            Self::Failed { failure } => Some(failure.prompt()),
            _ => None,
        }
    }
}

/// A classified submission failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{detail}")]
pub struct SubmissionFailure {
    pub kind: FailureKind,
    /// HTTP status, when the backend answered.
    pub status: Option<u16>,
    /// Technical description for logs.
    pub detail: String,
}

impl SubmissionFailure {
    /// Whether the same request may be sent again.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    /// User-facing projection of the failure.
    #[must_use]
    pub fn prompt(&self) -> RetryPrompt {
        match self.kind {
            FailureKind::Validation => RetryPrompt {
                message: format!("Please check your order details: {}", self.detail),
                retry_offered: false,
                edit_required: true,
            },
            FailureKind::Transient => RetryPrompt {
                message: "We could not confirm your order. Please try again.".to_string(),
                retry_offered: true,
                edit_required: false,
            },
            FailureKind::Unconfirmed => RetryPrompt {
                message: "We could not read the confirmation for your order. Please try again; \
                          it will not be placed twice."
                    .to_string(),
                retry_offered: true,
                edit_required: false,
            },
            FailureKind::Permanent => RetryPrompt {
                message: format!("Your order was not accepted: {}", self.detail),
                retry_offered: false,
                edit_required: true,
            },
        }
    }
}

impl From<&ApiError> for SubmissionFailure {
    fn from(err: &ApiError) -> Self {
        Self {
            kind: err.kind(),
            status: err.status(),
            detail: err.to_string(),
        }
    }
}

/// What the UI shows after a failed try.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPrompt {
    pub message: String,
    /// Show a retry control that resends with the same key.
    pub retry_offered: bool,
    /// Send the user back to edit the order.
    pub edit_required: bool,
}

/// Misuse of a checkout attempt, or the failure of a try.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("the order has already been placed")]
    AlreadySucceeded,
    #[error("nothing to retry: the last try cannot be resent")]
    NotRetryable,
    #[error("the last try may have gone through; retry it before changing the order")]
    OutcomeUnknown,
    #[error("{label} failed: {failure}")]
    Failed {
        label: &'static str,
        failure: SubmissionFailure,
    },
}

impl CheckoutError {
    /// The failure behind this error, if a try was made.
    #[must_use]
    pub const fn failure(&self) -> Option<&SubmissionFailure> {
        match self {
            Self::Failed { failure, .. } => Some(failure),
            _ => None,
        }
    }
}

// =============================================================================
// CheckoutAttempt
// =============================================================================

/// One logical checkout with its idempotency key.
pub struct CheckoutAttempt<S: Submission> {
    client: ApiClient,
    submission: S,
    key: IdempotencyKey,
    state: watch::Sender<CheckoutState>,
    tries: u32,
}

impl<S: Submission> CheckoutAttempt<S> {
    /// Start a new attempt and mint its key. Nothing is sent yet.
    #[must_use]
    pub fn begin(client: ApiClient, submission: S) -> Self {
        let key = IdempotencyKey::generate();
        debug!(kind = submission.label(), idempotency_key = %key, "Checkout attempt started");
        let (state, _) = watch::channel(CheckoutState::Idle);
        Self {
            client,
            submission,
            key,
            state,
            tries: 0,
        }
    }

    /// Continue an attempt under a key from an earlier run.
    ///
    /// The submission must be the one originally sent with `key`; the
    /// backend then answers with the order it already recorded, if any.
    #[must_use]
    pub fn resume(client: ApiClient, submission: S, key: IdempotencyKey) -> Self {
        info!(kind = submission.label(), idempotency_key = %key, "Checkout attempt resumed");
        let (state, _) = watch::channel(CheckoutState::Idle);
        Self {
            client,
            submission,
            key,
            state,
            tries: 0,
        }
    }

    /// The key sent with every try of this attempt.
    #[must_use]
    pub const fn key(&self) -> &IdempotencyKey {
        &self.key
    }

    #[must_use]
    pub const fn submission(&self) -> &S {
        &self.submission
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> CheckoutState {
        self.state.borrow().clone()
    }

    /// Watch state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CheckoutState> {
        self.state.subscribe()
    }

    /// Whether the submit control should be enabled.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        matches!(*self.state.borrow(), CheckoutState::Idle | CheckoutState::Failed { .. })
    }

    /// HTTP tries made so far.
    #[must_use]
    pub const fn tries(&self) -> u32 {
        self.tries
    }

    /// Send the order.
    ///
    /// After a transient failure this behaves like [`retry`](Self::retry).
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Failed`] when the try fails, or a misuse
    /// error when the attempt is not in a state that allows sending.
    pub async fn submit(&mut self) -> Result<Order, CheckoutError> {
        // A try in flight holds `&mut self`, so `Submitting` is never seen here.
        match self.state() {
            CheckoutState::Idle | CheckoutState::Submitting => self.run().await,
            CheckoutState::Failed { .. } => self.retry().await,
            CheckoutState::Succeeded(_) => Err(CheckoutError::AlreadySucceeded),
        }
    }

    /// Resend the identical request with the same key after a transient or
    /// unconfirmed failure.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::NotRetryable`] unless the last try may be
    /// resent, or [`CheckoutError::Failed`] when this try fails too.
    pub async fn retry(&mut self) -> Result<Order, CheckoutError> {
        match self.state() {
            CheckoutState::Failed { failure } if failure.is_retryable() => {
                info!(idempotency_key = %self.key, tries = self.tries, "Retrying with the same key");
                self.run().await
            }
            CheckoutState::Succeeded(_) => Err(CheckoutError::AlreadySucceeded),
            CheckoutState::Idle | CheckoutState::Submitting | CheckoutState::Failed { .. } => {
                Err(CheckoutError::NotRetryable)
            }
        }
    }

    /// Send, then retry transient failures automatically per `policy`.
    ///
    /// # Errors
    ///
    /// Returns the last failure once retries are exhausted or a failure is
    /// not transient.
    pub async fn submit_with(&mut self, policy: &RetryPolicy) -> Result<Order, CheckoutError> {
        let mut result = self.submit().await;
        let mut retries = 0;

        while let Err(CheckoutError::Failed { failure, .. }) = &result {
            if !failure.is_retryable() || retries >= policy.max_retries {
                break;
            }
            retries += 1;
            let delay = policy.delay_for(retries);
            warn!(
                retry = retries,
                max_retries = policy.max_retries,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %failure,
                "Transient checkout failure, retrying"
            );
            tokio::time::sleep(delay).await;
            result = self.retry().await;
        }

        result
    }

    /// Replace the order after it was rejected and start over with a new key.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::OutcomeUnknown`] while the last try may still
    /// have taken effect, and [`CheckoutError::AlreadySucceeded`] after success.
    pub fn revise(&mut self, submission: S) -> Result<(), CheckoutError> {
        match &*self.state.borrow() {
            CheckoutState::Succeeded(_) => return Err(CheckoutError::AlreadySucceeded),
            CheckoutState::Failed { failure } if failure.is_retryable() => {
                return Err(CheckoutError::OutcomeUnknown);
            }
            CheckoutState::Idle | CheckoutState::Submitting | CheckoutState::Failed { .. } => {}
        }
        self.submission = submission;
        self.key = IdempotencyKey::generate();
        self.tries = 0;
        self.state.send_replace(CheckoutState::Idle);
        debug!(idempotency_key = %self.key, "Checkout attempt revised");
        Ok(())
    }

    /// Give up on this attempt. Nothing is sent; the key is dropped.
    pub fn abandon(self) {
        debug!(
            kind = self.submission.label(),
            idempotency_key = %self.key,
            tries = self.tries,
            "Checkout attempt abandoned"
        );
    }

    async fn run(&mut self) -> Result<Order, CheckoutError> {
        let label = self.submission.label();

        if let Err(e) = self.submission.validate() {
            let failure = SubmissionFailure::from(&ApiError::from(e));
            warn!(kind = label, error = %failure, "Order rejected before sending");
            return Err(CheckoutError::Failed { label, failure });
        }

        self.tries += 1;
        self.state.send_replace(CheckoutState::Submitting);
        let guard = InFlightGuard::new(&self.state);
        let result = self.submission.submit(&self.client, &self.key).await;
        guard.disarm();

        match result {
            Ok(order) => {
                info!(
                    kind = label,
                    order_id = %order.id,
                    status = %order.status,
                    tries = self.tries,
                    "Checkout succeeded"
                );
                self.state.send_replace(CheckoutState::Succeeded(order.clone()));
                Ok(order)
            }
            Err(e) => {
                let failure = SubmissionFailure::from(&e);
                if failure.kind == FailureKind::Validation {
                    self.state.send_replace(CheckoutState::Idle);
                } else {
                    if failure.is_retryable() {
                        warn!(kind = label, error = %e, "Checkout failed, retry available");
                    } else {
                        error!(kind = label, error = %e, "Checkout rejected");
                    }
                    self.state.send_replace(CheckoutState::Failed {
                        failure: failure.clone(),
                    });
                }
                Err(CheckoutError::Failed { label, failure })
            }
        }
    }
}

impl<S: Submission + std::fmt::Debug> std::fmt::Debug for CheckoutAttempt<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutAttempt")
            .field("submission", &self.submission)
            .field("key", &self.key)
            .field("state", &*self.state.borrow())
            .field("tries", &self.tries)
            .finish_non_exhaustive()
    }
}

/// Marks a dropped in-flight try as a transient failure so it can be retried.
struct InFlightGuard<'a> {
    state: Option<&'a watch::Sender<CheckoutState>>,
}

impl<'a> InFlightGuard<'a> {
    const fn new(state: &'a watch::Sender<CheckoutState>) -> Self {
        Self { state: Some(state) }
    }

    fn disarm(mut self) {
        self.state = None;
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if let Some(state) = self.state.take() {
            state.send_replace(CheckoutState::Failed {
                failure: SubmissionFailure {
                    kind: FailureKind::Transient,
                    status: None,
                    detail: "submission interrupted before a response arrived".to_string(),
                },
            });
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use blossom_core::{DeliveryMethod, MemberId, OrderId, OrderStatus};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use url::Url;

    use super::*;
    use crate::config::ClientConfig;
    use crate::session::Session;
    use crate::types::DeliveryDetails;
    use crate::validate::ValidationError;

    /// Scripted submission that records the keys it was sent with.
    ///
    /// `Err(200)` stands for a success reply whose body could not be read.
    #[derive(Debug, Clone)]
    struct Scripted {
        outcomes: Arc<Mutex<Vec<Result<(), u16>>>>,
        keys: Arc<Mutex<Vec<String>>>,
        calls: Arc<AtomicUsize>,
        valid: bool,
    }

    impl Scripted {
        fn new(outcomes: Vec<Result<(), u16>>) -> Self {
            Self {
                outcomes: Arc::new(Mutex::new(outcomes)),
                keys: Arc::new(Mutex::new(Vec::new())),
                calls: Arc::new(AtomicUsize::new(0)),
                valid: true,
            }
        }

        fn keys(&self) -> Vec<String> {
            self.keys.lock().unwrap().clone()
        }
    }

    fn order() -> Order {
        Order {
            id: OrderId::new(1),
            order_no: "ORD-1".to_string(),
            total_amount: Decimal::from(10000),
            status: OrderStatus::Pending,
            items: Vec::new(),
            created_at: NaiveDate::from_ymd_opt(2025, 3, 1)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
        }
    }

    #[async_trait]
    impl Submission for Scripted {
        fn label(&self) -> &'static str {
            "scripted"
        }

        fn validate(&self) -> Result<(), ValidationError> {
            if self.valid {
                Ok(())
            } else {
                Err(ValidationError::new("deliveryName", "must not be empty"))
            }
        }

        async fn submit(&self, _client: &ApiClient, key: &IdempotencyKey) -> Result<Order, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.keys.lock().unwrap().push(key.to_string());
            let next = {
                let mut outcomes = self.outcomes.lock().unwrap();
                if outcomes.is_empty() { Ok(()) } else { outcomes.remove(0) }
            };
            match next {
                Ok(()) => Ok(order()),
                Err(200) => Err(ApiError::Unconfirmed("missing field `id`".to_string())),
                Err(status) => Err(ApiError::Status {
                    status,
                    message: "scripted".to_string(),
                }),
            }
        }
    }

    fn client() -> ApiClient {
        let config = ClientConfig::new(Url::parse("http://127.0.0.1:9").unwrap());
        ApiClient::new(&config, Session::in_memory()).unwrap()
    }

    #[tokio::test]
    async fn test_success_is_terminal() {
        let script = Scripted::new(vec![Ok(())]);
        let mut attempt = CheckoutAttempt::begin(client(), script.clone());
        assert!(attempt.can_submit());

        let placed = attempt.submit().await.unwrap();
        assert_eq!(placed.id, OrderId::new(1));
        assert!(attempt.state().is_terminal());
        assert!(!attempt.can_submit());
        assert_eq!(attempt.submit().await, Err(CheckoutError::AlreadySucceeded));
        assert_eq!(script.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_reuses_key() {
        let script = Scripted::new(vec![Err(500), Ok(())]);
        let mut attempt = CheckoutAttempt::begin(client(), script.clone());

        let err = attempt.submit().await.unwrap_err();
        let prompt = attempt.state().prompt().unwrap();
        assert!(err.failure().unwrap().is_retryable());
        assert!(prompt.retry_offered);
        assert!(!prompt.edit_required);

        attempt.retry().await.unwrap();
        let keys = script.keys();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0], keys[1]);
        assert_eq!(keys[0], attempt.key().as_str());
        assert_eq!(attempt.tries(), 2);
    }

    #[tokio::test]
    async fn test_permanent_failure_requires_revise() {
        let script = Scripted::new(vec![Err(409), Ok(())]);
        let mut attempt = CheckoutAttempt::begin(client(), script.clone());
        let first_key = attempt.key().clone();

        attempt.submit().await.unwrap_err();
        let prompt = attempt.state().prompt().unwrap();
        assert!(!prompt.retry_offered);
        assert!(prompt.edit_required);
        assert_eq!(attempt.retry().await, Err(CheckoutError::NotRetryable));

        attempt.revise(script.clone()).unwrap();
        assert_ne!(attempt.key(), &first_key);
        assert_eq!(attempt.state(), CheckoutState::Idle);

        attempt.submit().await.unwrap();
        let keys = script.keys();
        assert_ne!(keys[0], keys[1]);
    }

    #[tokio::test]
    async fn test_unreadable_confirmation_keeps_the_key() {
        let script = Scripted::new(vec![Err(200), Ok(())]);
        let mut attempt = CheckoutAttempt::begin(client(), script.clone());
        let key = attempt.key().clone();

        let err = attempt.submit().await.unwrap_err();
        assert_eq!(err.failure().unwrap().kind, FailureKind::Unconfirmed);
        let prompt = attempt.state().prompt().unwrap();
        assert!(prompt.retry_offered);
        assert!(!prompt.edit_required);

        assert_eq!(attempt.revise(script.clone()), Err(CheckoutError::OutcomeUnknown));
        assert_eq!(attempt.key(), &key);

        attempt.retry().await.unwrap();
        assert_eq!(script.keys(), vec![key.to_string(), key.to_string()]);
    }

    #[tokio::test]
    async fn test_transient_failure_blocks_revise() {
        let script = Scripted::new(vec![Err(503)]);
        let mut attempt = CheckoutAttempt::begin(client(), script.clone());

        attempt.submit().await.unwrap_err();
        assert_eq!(attempt.revise(script), Err(CheckoutError::OutcomeUnknown));
    }

    #[tokio::test]
    async fn test_resume_sends_the_given_key() {
        let script = Scripted::new(vec![Ok(())]);
        let key = IdempotencyKey::generate();
        let mut attempt = CheckoutAttempt::resume(client(), script.clone(), key.clone());

        assert_eq!(attempt.state(), CheckoutState::Idle);
        attempt.submit().await.unwrap();
        assert_eq!(script.keys(), vec![key.to_string()]);
    }

    #[tokio::test]
    async fn test_validation_failure_sends_nothing() {
        let mut script = Scripted::new(Vec::new());
        script.valid = false;
        let mut attempt = CheckoutAttempt::begin(client(), script.clone());

        let err = attempt.submit().await.unwrap_err();
        assert_eq!(err.failure().unwrap().kind, FailureKind::Validation);
        assert_eq!(attempt.state(), CheckoutState::Idle);
        assert_eq!(script.calls.load(Ordering::SeqCst), 0);
        assert_eq!(attempt.tries(), 0);
    }

    #[tokio::test]
    async fn test_retry_from_idle_is_refused() {
        let mut attempt = CheckoutAttempt::begin(client(), Scripted::new(Vec::new()));
        assert_eq!(attempt.retry().await, Err(CheckoutError::NotRetryable));
    }

    #[tokio::test]
    async fn test_subscribers_see_transitions() {
        let script = Scripted::new(vec![Err(503)]);
        let mut attempt = CheckoutAttempt::begin(client(), script);
        let mut rx = attempt.subscribe();
        assert_eq!(*rx.borrow_and_update(), CheckoutState::Idle);

        attempt.submit().await.unwrap_err();
        assert!(rx.has_changed().unwrap());
        assert!(matches!(*rx.borrow_and_update(), CheckoutState::Failed { .. }));
    }

    fn immediate(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn test_automatic_retries_stop_at_policy_limit() {
        let script = Scripted::new(vec![Err(502), Err(502), Err(502), Ok(())]);
        let mut attempt = CheckoutAttempt::begin(client(), script.clone());
        let policy = immediate(2);

        let err = attempt.submit_with(&policy).await.unwrap_err();
        assert_eq!(err.failure().unwrap().status, Some(502));
        assert_eq!(script.calls.load(Ordering::SeqCst), 3);
        let keys = script.keys();
        assert!(keys.iter().all(|k| k == &keys[0]));

        // The retry control is still offered after automatic retries run out.
        attempt.retry().await.unwrap();
    }

    #[tokio::test]
    async fn test_automatic_retries_skip_permanent_failures() {
        let script = Scripted::new(vec![Err(422)]);
        let mut attempt = CheckoutAttempt::begin(client(), script.clone());

        attempt.submit_with(&immediate(3)).await.unwrap_err();
        assert_eq!(script.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_new_attempts_get_new_keys() {
        let delivery = DeliveryDetails::new(DeliveryMethod::Pickup, "Kim", "010", "Seoul");
        let first = CheckoutAttempt::begin(client(), CartOrder::new(MemberId::new(1), delivery.clone()));
        let second = CheckoutAttempt::begin(client(), CartOrder::new(MemberId::new(1), delivery));
        assert_ne!(first.key(), second.key());
        second.abandon();
    }
}
