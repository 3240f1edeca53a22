//! Retryable, asynchronously-completed units of network work.
//!
//! An [`Action`] wraps one outbound request to the chat service together with
//! the logic to interpret its response. The [`executor::ActionExecutor`]
//! drives the attempt loop; the action itself decides, per decoded response,
//! whether the attempt succeeded, failed terminally, or should be retried
//! after a delay ([`Disposition`]).
//!
//! Completion flows through a [`Completion`] handle that settles exactly
//! once. Callers receive either a [`Delivery`] on the success side (the
//! confirmed post, or a quiet supersession signal) or an [`ActionError`].

pub mod executor;
pub mod post_message;

use std::fmt;

use tokio::sync::oneshot;
use tracing::error;

use crate::message::PostedMessage;
use crate::room::RoomId;
use crate::transport::{ApiRequest, TransportError};

/// Signal an action returns from response interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Terminal; the action has already settled its completion with success.
    Success,
    /// Terminal; the action has already settled its completion with failure.
    Failure,
    /// Send again after this delay. The executor re-checks validity and
    /// increments the attempt number before the next send.
    RetryAfter(std::time::Duration),
}

/// Failure identity an action variant declares for executor-raised errors.
///
/// When the executor itself has to fail an action (transport error, retry
/// budget exhausted), it brands the error with this kind so callers can
/// tell "posting the message failed" apart from failures of other action
/// variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A message post could not be completed.
    MessagePost,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::MessagePost => f.write_str("message post"),
        }
    }
}

/// Terminal failures surfaced to the caller awaiting an action.
///
/// The transient null-acknowledgement anomaly never appears here; it is
/// absorbed locally by the retry loop.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// The transport failed before a response body could be decoded.
    #[error("{kind} failed: {source}")]
    Transport {
        /// Which action variant the failure belongs to.
        kind: ErrorKind,
        /// The underlying transport failure.
        #[source]
        source: TransportError,
    },

    /// The service answered with a shape the action does not recognise.
    #[error("{kind} failed: invalid response from server")]
    InvalidResponse {
        /// Which action variant the failure belongs to.
        kind: ErrorKind,
    },

    /// The attempt budget ran out while the action kept asking to retry.
    #[error("{kind} failed: retry budget exhausted after {attempts} attempts")]
    RetryBudgetExhausted {
        /// Which action variant the failure belongs to.
        kind: ErrorKind,
        /// How many attempts were made before giving up.
        attempts: u32,
    },

    /// The executor task was torn down before the action settled.
    ///
    /// Only reachable at process shutdown; the request may or may not have
    /// gone out, so this is neither a supersession nor a server failure.
    #[error("{kind} failed: interrupted before completion")]
    Interrupted {
        /// Which action variant the failure belongs to.
        kind: ErrorKind,
    },
}

/// Success-side outcome delivered to the caller of a message post.
#[derive(Debug, Clone)]
pub enum Delivery {
    /// The service confirmed the message.
    Posted(PostedMessage),
    /// Another submission superseded this one before it could send; nothing
    /// was posted and nothing went wrong.
    Superseded,
}

/// What the caller's future ultimately resolves to.
pub type DeliveryResult = Result<Delivery, ActionError>;

/// One-shot completion handle for an action's result.
///
/// Settles exactly once: a second settle attempt is a contract violation by
/// the action implementation, logged as a bug and otherwise ignored rather
/// than panicking. A dropped receiver (the caller gave up) is not an error.
pub struct Completion<T> {
    sender: Option<oneshot::Sender<T>>,
}

// Manual Debug impl because oneshot::Sender doesn't implement Debug.
impl<T> fmt::Debug for Completion<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("settled", &self.sender.is_none())
            .finish()
    }
}

impl<T> Completion<T> {
    /// Create a completion handle and the receiver the caller awaits.
    pub fn new() -> (Self, oneshot::Receiver<T>) {
        let (tx, rx) = oneshot::channel();
        (Self { sender: Some(tx) }, rx)
    }

    /// Settle with the given value.
    ///
    /// If the completion has already settled, logs the violation and does
    /// nothing. If the receiver is gone, the value is silently discarded.
    pub fn settle(&mut self, value: T) {
        match self.sender.take() {
            Some(sender) => {
                let _ = sender.send(value);
            }
            None => error!("BUG: action completion settled twice, ignoring second resolution"),
        }
    }

    /// Whether the completion has already settled.
    pub fn is_settled(&self) -> bool {
        self.sender.is_none()
    }
}

/// One idempotency-aware, retryable network operation.
///
/// All methods are synchronous; suspension points (the send itself, backoff
/// waits) belong to the executor. Implementations settle their own completion
/// from [`process_response`](Action::process_response), `abandon`, and `fail`.
pub trait Action: Send {
    /// Room this action targets.
    fn room(&self) -> &RoomId;

    /// Descriptor of the request to send on each attempt.
    fn request(&self) -> ApiRequest;

    /// Cheap, side-effect-free check evaluated before every send attempt.
    ///
    /// Returning false means the action has been superseded: the executor
    /// abandons it without sending and without treating it as a failure.
    fn is_valid(&self) -> bool;

    /// Interpret a decoded response for the given attempt number (1-based).
    ///
    /// On [`Disposition::Success`] and [`Disposition::Failure`] the action
    /// has already settled its completion by the time this returns. A
    /// [`Disposition::RetryAfter`] carries the action's own backoff policy;
    /// the executor has none of its own for this case.
    fn process_response(&mut self, body: &serde_json::Value, attempt: u32) -> Disposition;

    /// Failure identity for errors the executor raises on this action's
    /// behalf.
    fn error_kind(&self) -> ErrorKind;

    /// Settle as superseded. Called by the executor when
    /// [`is_valid`](Action::is_valid) returns false.
    fn abandon(&mut self);

    /// Settle with an executor-raised failure.
    fn fail(&mut self, error: ActionError);
}
