//! Caller-facing chat client.
//!
//! [`ChatClient`] is the only surface other bot components need: hand it
//! text, get back a future that settles exactly once to a confirmed post, a
//! quiet supersession, or a typed failure. Everything in between (request
//! construction, tracker bookkeeping, the retry loop) stays inside.

use std::sync::Arc;

use tracing::debug;

use crate::action::executor::ActionExecutor;
use crate::action::post_message::PostMessageAction;
use crate::action::{ActionError, DeliveryResult, ErrorKind};
use crate::config::CourierConfig;
use crate::message::PendingMessage;
use crate::room::RoomId;
use crate::tracker::PostedMessageTracker;
use crate::transport::{ApiRequest, HttpTransport, Transport};

/// Client for posting messages to the chat service.
///
/// Cheap to share behind an [`Arc`]. Actions for different rooms run fully
/// concurrently; within one room, callers are expected to serialise sends
/// (the tracker assumes at most one in-flight post per room).
pub struct ChatClient {
    base_url: String,
    tracker: Arc<PostedMessageTracker>,
    executor: ActionExecutor,
}

impl ChatClient {
    /// Create a client talking HTTP to the configured chat service.
    pub fn new(config: &CourierConfig) -> Self {
        let transport = Arc::new(HttpTransport::new(
            config.http.connect_timeout(),
            config.http.request_timeout(),
        ));
        Self::with_transport(transport, config)
    }

    /// Create a client over a custom transport (used by tests and by bots
    /// that bring their own HTTP stack).
    pub fn with_transport(transport: Arc<dyn Transport>, config: &CourierConfig) -> Self {
        Self {
            base_url: config.chat.base_url.trim_end_matches('/').to_owned(),
            tracker: Arc::new(PostedMessageTracker::new()),
            executor: ActionExecutor::new(transport, config.retry.max_attempts),
        }
    }

    /// The tracker recording each room's most recent submission.
    pub fn tracker(&self) -> &Arc<PostedMessageTracker> {
        &self.tracker
    }

    /// Post a message to a room.
    ///
    /// Resolves once the service confirms the post, the action is superseded
    /// by a newer submission for the room, or a terminal failure occurs.
    /// The transient null-acknowledgement anomaly is retried internally and
    /// never surfaces here.
    pub async fn post_message(&self, room: &RoomId, text: impl Into<String>) -> DeliveryResult {
        let message = Arc::new(PendingMessage::new(room.clone(), text));
        self.submit(message).await
    }

    /// Post a reply addressed at an earlier posted message.
    ///
    /// The service's reply marker is a `:{message_id}` prefix on the text.
    pub async fn post_reply(
        &self,
        room: &RoomId,
        parent_id: u64,
        text: impl Into<String>,
    ) -> DeliveryResult {
        let text = format!(":{parent_id} {}", text.into());
        let message = Arc::new(PendingMessage::new(room.clone(), text));
        self.submit(message).await
    }

    async fn submit(&self, message: Arc<PendingMessage>) -> DeliveryResult {
        self.tracker.submit_message(Arc::clone(&message));

        let request = ApiRequest::post(
            format!(
                "{}/chats/{}/messages/new",
                self.base_url,
                message.room()
            ),
            serde_json::json!({ "text": message.text() }),
        );

        debug!(
            room = %message.room(),
            message = %message.id(),
            "submitting message post"
        );

        let (action, receiver) =
            PostMessageAction::new(request, Arc::clone(&self.tracker), message);

        let executor = self.executor.clone();
        tokio::spawn(async move {
            executor.run(Box::new(action)).await;
        });

        match receiver.await {
            Ok(result) => result,
            // The executor task was dropped before settling; only happens
            // when the runtime is shutting down.
            Err(_) => Err(ActionError::Interrupted {
                kind: ErrorKind::MessagePost,
            }),
        }
    }
}
