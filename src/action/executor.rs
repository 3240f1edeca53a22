//! The attempt loop shared by all action variants.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::transport::Transport;

use super::{Action, ActionError, Disposition};

/// Default cap on send attempts per action.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Drives an [`Action`] through validate/send/interpret cycles until a
/// terminal outcome.
///
/// The executor owns the attempt counter and the attempt cap; the per-attempt
/// retry delay comes from the action itself. Backoff waits suspend only this
/// action's task; other in-flight actions proceed untouched.
#[derive(Clone)]
pub struct ActionExecutor {
    transport: Arc<dyn Transport>,
    max_attempts: u32,
}

impl ActionExecutor {
    /// Create an executor over the given transport.
    ///
    /// `max_attempts` bounds the retry loop for actions that keep receiving
    /// the transient null acknowledgement; it must be at least 1.
    pub fn new(transport: Arc<dyn Transport>, max_attempts: u32) -> Self {
        Self {
            transport,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Run the action to its terminal state.
    ///
    /// Every path settles the action's completion exactly once: supersession
    /// via [`Action::abandon`], transport failure and budget exhaustion via
    /// [`Action::fail`], and server-confirmed outcomes inside
    /// [`Action::process_response`].
    pub async fn run(&self, mut action: Box<dyn Action>) {
        let mut attempt: u32 = 1;

        loop {
            if !action.is_valid() {
                debug!(room = %action.room(), attempt, "action superseded, abandoning");
                action.abandon();
                return;
            }

            let request = action.request();
            let body = match self.transport.send(&request).await {
                Ok(body) => body,
                Err(e) => {
                    warn!(room = %action.room(), attempt, error = %e, "transport failure");
                    let kind = action.error_kind();
                    action.fail(ActionError::Transport { kind, source: e });
                    return;
                }
            };

            match action.process_response(&body, attempt) {
                Disposition::Success | Disposition::Failure => return,
                Disposition::RetryAfter(delay) => {
                    if attempt >= self.max_attempts {
                        warn!(
                            room = %action.room(),
                            attempts = attempt,
                            "retry budget exhausted, failing action"
                        );
                        let kind = action.error_kind();
                        action.fail(ActionError::RetryBudgetExhausted {
                            kind,
                            attempts: attempt,
                        });
                        return;
                    }

                    tokio::time::sleep(delay).await;
                    attempt = attempt.saturating_add(1);
                }
            }
        }
    }
}
