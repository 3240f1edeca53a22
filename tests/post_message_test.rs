//! PostMessageAction response-interpretation and validity tests.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use courier::action::post_message::PostMessageAction;
use courier::action::{Action, ActionError, Delivery, Disposition};
use courier::message::PendingMessage;
use courier::room::RoomId;
use courier::tracker::PostedMessageTracker;
use courier::transport::ApiRequest;

fn post_action(
    tracker: &Arc<PostedMessageTracker>,
    room: &RoomId,
    text: &str,
) -> (
    PostMessageAction,
    tokio::sync::oneshot::Receiver<courier::action::DeliveryResult>,
) {
    let message = Arc::new(PendingMessage::new(room.clone(), text));
    tracker.submit_message(Arc::clone(&message));
    let request = ApiRequest::post("http://chat.test/chats/11/messages/new", json!({"text": text}));
    PostMessageAction::new(request, Arc::clone(tracker), message)
}

#[tokio::test]
async fn confirmed_response_succeeds_and_updates_tracker() {
    let tracker = Arc::new(PostedMessageTracker::new());
    let room = RoomId::new("11");
    let (mut action, receiver) = post_action(&tracker, &room, "hello");

    let disposition = action.process_response(&json!({"id": 42, "time": 1000}), 1);
    assert_eq!(disposition, Disposition::Success);

    let delivery = receiver
        .await
        .expect("completion should settle")
        .expect("post should succeed");
    let posted = match delivery {
        Delivery::Posted(posted) => posted,
        Delivery::Superseded => panic!("expected a confirmed post"),
    };
    assert_eq!(posted.room(), &room);
    assert_eq!(posted.message_id(), 42);
    assert_eq!(posted.server_time(), 1000);
    assert_eq!(posted.origin().text(), "hello");

    // Tracker saw the confirmation before the caller did.
    let latest = tracker.latest_posted(&room).expect("confirmation pushed");
    assert_eq!(latest.message_id(), 42);
}

#[tokio::test]
async fn unrecognized_response_fails_without_retry() {
    let tracker = Arc::new(PostedMessageTracker::new());
    let room = RoomId::new("11");
    let (mut action, receiver) = post_action(&tracker, &room, "hello");

    let disposition = action.process_response(&json!({"foo": "bar"}), 1);
    assert_eq!(disposition, Disposition::Failure);

    let result = receiver.await.expect("completion should settle");
    let error = result.expect_err("shape error should fail the post");
    assert!(matches!(error, ActionError::InvalidResponse { .. }));
    assert!(error.to_string().contains("invalid response from server"));

    assert!(tracker.latest_posted(&room).is_none());
}

#[test]
fn null_ack_delay_grows_linearly_with_attempt() {
    let tracker = Arc::new(PostedMessageTracker::new());
    let room = RoomId::new("11");
    let (mut action, _receiver) = post_action(&tracker, &room, "hello");
    let body = json!({"id": null, "time": null});

    assert_eq!(
        action.process_response(&body, 1),
        Disposition::RetryAfter(Duration::from_millis(1000))
    );
    assert_eq!(
        action.process_response(&body, 2),
        Disposition::RetryAfter(Duration::from_millis(2000))
    );
    assert_eq!(
        action.process_response(&body, 3),
        Disposition::RetryAfter(Duration::from_millis(3000))
    );
}

#[test]
fn valid_while_still_the_rooms_current_message() {
    let tracker = Arc::new(PostedMessageTracker::new());
    let room = RoomId::new("11");
    let (action, _receiver) = post_action(&tracker, &room, "hello");

    assert!(action.is_valid());
}

#[test]
fn superseded_by_a_newer_submission() {
    let tracker = Arc::new(PostedMessageTracker::new());
    let room = RoomId::new("11");
    let (action, _receiver) = post_action(&tracker, &room, "hello");

    let newer = Arc::new(PendingMessage::new(room.clone(), "newer"));
    tracker.submit_message(newer);

    assert!(!action.is_valid());
}

#[test]
fn invalid_when_room_has_no_tracked_message() {
    let tracker = Arc::new(PostedMessageTracker::new());
    let room = RoomId::new("11");
    let message = Arc::new(PendingMessage::new(room.clone(), "hello"));
    // Deliberately not submitted to the tracker.
    let request = ApiRequest::post("http://chat.test/x", json!({"text": "hello"}));
    let (action, _receiver) = PostMessageAction::new(request, Arc::clone(&tracker), message);

    assert!(!action.is_valid());
}

#[tokio::test]
async fn abandon_settles_as_superseded() {
    let tracker = Arc::new(PostedMessageTracker::new());
    let room = RoomId::new("11");
    let (mut action, receiver) = post_action(&tracker, &room, "hello");

    action.abandon();

    let delivery = receiver
        .await
        .expect("completion should settle")
        .expect("supersession is not an error");
    assert!(matches!(delivery, Delivery::Superseded));
}
