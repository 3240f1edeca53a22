//! Chat room identity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a chat room on the service.
///
/// Rooms are independent delivery targets: actions for different rooms run
/// concurrently and share no state besides their own tracker slots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomId(String);

impl RoomId {
    /// Create a room identifier from its service-side string form.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The service-side string form of the identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}
