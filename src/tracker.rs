//! Per-room bookkeeping of the most recent send.
//!
//! The chat service rejects a message that exactly repeats the immediately
//! preceding send, so every room keeps one slot recording the latest
//! submission. An in-flight action checks before each attempt that it is
//! still the room's current message ([`PostedMessageTracker::peek_message`]);
//! if another submission has taken the slot, the action abandons quietly
//! instead of posting a stale duplicate.
//!
//! Slots live for the process lifetime. There is no eviction: the duplicate
//! window only ever needs the single most recent entry per room.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::warn;

use crate::message::{PendingMessage, PostedMessage};
use crate::room::RoomId;

/// Latest entry for a room: an unconfirmed submission, or its confirmation.
#[derive(Debug)]
enum Slot {
    Pending(Arc<PendingMessage>),
    Posted(Arc<PostedMessage>),
}

impl Slot {
    fn pending(&self) -> Arc<PendingMessage> {
        match self {
            Slot::Pending(message) => Arc::clone(message),
            Slot::Posted(message) => Arc::clone(message.origin()),
        }
    }
}

/// Process-wide map from room to its most recent submission.
///
/// Uses a sync [`Mutex`] since every critical section is a short map access
/// with no awaits. The expected access pattern is one in-flight post per room
/// at a time (callers serialise sends per room), so the slot only needs
/// atomic read/replace semantics.
#[derive(Debug, Default)]
pub struct PostedMessageTracker {
    rooms: Mutex<HashMap<RoomId, Slot>>,
}

impl PostedMessageTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pending message as its room's current submission.
    ///
    /// Replaces whatever the slot held before; any action still working on
    /// the previous entry will see itself superseded at its next validity
    /// check.
    pub fn submit_message(&self, message: Arc<PendingMessage>) {
        let room = message.room().clone();
        match self.rooms.lock() {
            Ok(mut rooms) => {
                rooms.insert(room, Slot::Pending(message));
            }
            Err(e) => warn!(error = %e, room = %room, "tracker lock poisoned, dropping submission"),
        }
    }

    /// The most recently submitted message for the room, confirmed or not.
    ///
    /// Returns `None` when nothing has ever been submitted for the room.
    pub fn peek_message(&self, room: &RoomId) -> Option<Arc<PendingMessage>> {
        match self.rooms.lock() {
            Ok(rooms) => rooms.get(room).map(Slot::pending),
            Err(e) => {
                warn!(error = %e, room = %room, "tracker lock poisoned, peek returns nothing");
                None
            }
        }
    }

    /// Record a confirmed post, atomically replacing the room's peeked entry.
    pub fn push_message(&self, message: Arc<PostedMessage>) {
        let room = message.room().clone();
        match self.rooms.lock() {
            Ok(mut rooms) => {
                rooms.insert(room, Slot::Posted(message));
            }
            Err(e) => warn!(error = %e, room = %room, "tracker lock poisoned, dropping confirmation"),
        }
    }

    /// The most recent confirmed post for the room, if the latest submission
    /// has been confirmed.
    pub fn latest_posted(&self, room: &RoomId) -> Option<Arc<PostedMessage>> {
        match self.rooms.lock() {
            Ok(rooms) => match rooms.get(room) {
                Some(Slot::Posted(message)) => Some(Arc::clone(message)),
                Some(Slot::Pending(_)) | None => None,
            },
            Err(e) => {
                warn!(error = %e, room = %room, "tracker lock poisoned");
                None
            }
        }
    }
}
