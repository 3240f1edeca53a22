//! Posting a message, and the service's acknowledgement quirks.

use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::{debug, error, warn};

use crate::message::{PendingMessage, PostedMessage};
use crate::room::RoomId;
use crate::tracker::PostedMessageTracker;
use crate::transport::ApiRequest;

use super::{Action, ActionError, Completion, Delivery, DeliveryResult, Disposition, ErrorKind};

/// Decoded shape of a message-post acknowledgement body.
///
/// The service answers a post with a JSON object that normally carries the
/// new message's `id` and `time`. Presence, null, and absence of those keys
/// mean three different things, so the distinction is made explicit here
/// instead of being probed field-by-field at the call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostAck {
    /// Both `id` and `time` present with real values: the post happened.
    Confirmed {
        /// Server-assigned message id.
        id: u64,
        /// Server-assigned unix timestamp.
        time: i64,
    },
    /// `id` present but null (`{"id": null, "time": null}`): the transient
    /// anomaly the service produces when we repeat ourselves too quickly.
    NullAck,
    /// No `id` key at all: a response shape we don't understand.
    Unrecognized,
}

impl PostAck {
    /// Classify a decoded acknowledgement body.
    pub fn decode(body: &serde_json::Value) -> Self {
        let id = match body.get("id") {
            None => return PostAck::Unrecognized,
            Some(serde_json::Value::Null) => return PostAck::NullAck,
            Some(value) => match value.as_u64() {
                Some(id) => id,
                None => return PostAck::Unrecognized,
            },
        };

        // An id without a usable time behaves like the null-ack case: the
        // service acknowledged something but not a completed post.
        match body.get("time").and_then(serde_json::Value::as_i64) {
            Some(time) => PostAck::Confirmed { id, time },
            None => PostAck::NullAck,
        }
    }
}

/// Backoff unit for the null-ack retry path: attempt n waits n seconds.
const NULL_ACK_DELAY_UNIT_MS: u64 = 1_000;

/// Action that posts one [`PendingMessage`] and confirms it.
///
/// On confirmation the tracker is updated before the caller's future
/// resolves, so duplicate-detection for the room sees the post immediately.
#[derive(Debug)]
pub struct PostMessageAction {
    room: RoomId,
    request: ApiRequest,
    tracker: Arc<PostedMessageTracker>,
    message: Arc<PendingMessage>,
    completion: Completion<DeliveryResult>,
}

impl PostMessageAction {
    /// Create the action and the receiver its caller awaits.
    ///
    /// The message must already be registered with the tracker as the room's
    /// current submission; [`crate::client::ChatClient`] does this before
    /// constructing the action.
    pub fn new(
        request: ApiRequest,
        tracker: Arc<PostedMessageTracker>,
        message: Arc<PendingMessage>,
    ) -> (Self, oneshot::Receiver<DeliveryResult>) {
        let (completion, receiver) = Completion::new();
        let action = Self {
            room: message.room().clone(),
            request,
            tracker,
            message,
            completion,
        };
        (action, receiver)
    }

    fn succeed(&mut self, posted: PostedMessage) {
        self.completion.settle(Ok(Delivery::Posted(posted)));
    }
}

impl Action for PostMessageAction {
    fn room(&self) -> &RoomId {
        &self.room
    }

    fn request(&self) -> ApiRequest {
        self.request.clone()
    }

    /// Still valid only while this message is the room's current submission.
    fn is_valid(&self) -> bool {
        self.tracker
            .peek_message(&self.room)
            .is_some_and(|current| Arc::ptr_eq(&current, &self.message))
    }

    fn process_response(&mut self, body: &serde_json::Value, attempt: u32) -> Disposition {
        match PostAck::decode(body) {
            PostAck::Confirmed { id, time } => {
                let posted =
                    PostedMessage::new(self.room.clone(), id, time, Arc::clone(&self.message));
                self.tracker.push_message(Arc::new(posted.clone()));

                debug!(
                    room = %self.room,
                    message = %self.message.id(),
                    message_id = id,
                    "message post confirmed"
                );
                self.succeed(posted);
                Disposition::Success
            }
            PostAck::Unrecognized => {
                error!(
                    room = %self.room,
                    message = %self.message.id(),
                    body = %body,
                    "received a message post response that we don't understand"
                );
                self.completion.settle(Err(ActionError::InvalidResponse {
                    kind: self.error_kind(),
                }));
                Disposition::Failure
            }
            PostAck::NullAck => {
                // Believed to happen when we repeat ourselves too quickly;
                // self-resolving, so wait it out rather than surface it.
                let delay_ms = u64::from(attempt).saturating_mul(NULL_ACK_DELAY_UNIT_MS);
                warn!(
                    room = %self.room,
                    message = %self.message.id(),
                    attempt,
                    delay_ms,
                    "got a null message post response, waiting before trying again"
                );
                Disposition::RetryAfter(std::time::Duration::from_millis(delay_ms))
            }
        }
    }

    fn error_kind(&self) -> ErrorKind {
        ErrorKind::MessagePost
    }

    fn abandon(&mut self) {
        debug!(
            room = %self.room,
            message = %self.message.id(),
            "message post superseded, nothing sent"
        );
        self.completion.settle(Ok(Delivery::Superseded));
    }

    fn fail(&mut self, error: ActionError) {
        self.completion.settle(Err(error));
    }
}
