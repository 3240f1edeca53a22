//! Courier: reliable message delivery for a chat bot.
//!
//! The chat service this bot talks to is flaky in specific, documented ways:
//! it can acknowledge a post with `{"id": null, "time": null}` instead of an
//! error, and it rejects messages that exactly repeat a very recent send.
//! Courier wraps each outbound operation in an [`action::Action`] driven by an
//! attempt loop with validity re-checks, linear backoff on null
//! acknowledgements, and a completion handle that settles exactly once.
//!
//! Callers go through [`client::ChatClient`], which returns either a confirmed
//! [`message::PostedMessage`], a quiet supersession signal, or a typed
//! [`action::ActionError`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod action;
pub mod client;
pub mod config;
pub mod logging;
pub mod message;
pub mod room;
pub mod tracker;
pub mod transport;
