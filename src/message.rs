//! Message value objects.
//!
//! [`PendingMessage`] is content submitted for posting but not yet confirmed;
//! [`PostedMessage`] is the same content once the service has acknowledged it
//! with a real id and timestamp. Both are immutable after construction.
//!
//! Identity of a pending message is object identity: two messages with the
//! same text are distinct submissions (repeating yourself is a real,
//! expected case), so duplicate-suppression checks compare `Arc` pointers,
//! never content.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::room::RoomId;

/// Content submitted for posting, not yet confirmed by the service.
#[derive(Debug)]
pub struct PendingMessage {
    id: Uuid,
    room: RoomId,
    text: String,
    created_at: DateTime<Utc>,
}

impl PendingMessage {
    /// Create a pending message for the given room.
    pub fn new(room: RoomId, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            room,
            text: text.into(),
            created_at: Utc::now(),
        }
    }

    /// Correlation id used in log output.
    ///
    /// Diagnostic only; message identity for supersession checks is the
    /// `Arc` pointer, not this id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Room this message targets.
    pub fn room(&self) -> &RoomId {
        &self.room
    }

    /// Text content to post.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// When this message was constructed.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Content confirmed as posted, with the server-assigned id and timestamp.
///
/// Created only by a successful post action; keeps a back-reference to the
/// originating [`PendingMessage`] so the tracker can answer "what is the
/// room's current message" after confirmation.
#[derive(Debug, Clone)]
pub struct PostedMessage {
    room: RoomId,
    message_id: u64,
    server_time: i64,
    origin: Arc<PendingMessage>,
}

impl PostedMessage {
    /// Build a confirmation from the server-assigned fields and the
    /// originating pending message.
    pub fn new(room: RoomId, message_id: u64, server_time: i64, origin: Arc<PendingMessage>) -> Self {
        Self {
            room,
            message_id,
            server_time,
            origin,
        }
    }

    /// Room the message was posted to.
    pub fn room(&self) -> &RoomId {
        &self.room
    }

    /// Server-assigned message id.
    pub fn message_id(&self) -> u64 {
        self.message_id
    }

    /// Server-assigned unix timestamp, as received.
    pub fn server_time(&self) -> i64 {
        self.server_time
    }

    /// Server timestamp as a UTC datetime, if it is representable.
    pub fn posted_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.server_time, 0)
    }

    /// The pending message this confirmation originated from.
    pub fn origin(&self) -> &Arc<PendingMessage> {
        &self.origin
    }
}
