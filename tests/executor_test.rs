//! Attempt-loop tests over a scripted transport.

mod common;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use common::MockTransport;
use courier::action::executor::ActionExecutor;
use courier::action::post_message::PostMessageAction;
use courier::action::{ActionError, Delivery, DeliveryResult};
use courier::message::PendingMessage;
use courier::room::RoomId;
use courier::tracker::PostedMessageTracker;
use courier::transport::{ApiRequest, Transport};

struct Fixture {
    transport: Arc<MockTransport>,
    tracker: Arc<PostedMessageTracker>,
    room: RoomId,
}

impl Fixture {
    fn new() -> Self {
        Self {
            transport: Arc::new(MockTransport::new()),
            tracker: Arc::new(PostedMessageTracker::new()),
            room: RoomId::new("11"),
        }
    }

    fn executor(&self, max_attempts: u32) -> ActionExecutor {
        ActionExecutor::new(Arc::clone(&self.transport) as Arc<dyn Transport>, max_attempts)
    }

    fn action(
        &self,
        text: &str,
    ) -> (
        PostMessageAction,
        tokio::sync::oneshot::Receiver<DeliveryResult>,
    ) {
        let message = Arc::new(PendingMessage::new(self.room.clone(), text));
        self.tracker.submit_message(Arc::clone(&message));
        let request = ApiRequest::post(
            "http://chat.test/chats/11/messages/new",
            json!({"text": text}),
        );
        PostMessageAction::new(request, Arc::clone(&self.tracker), message)
    }
}

#[tokio::test]
async fn transport_failure_fails_the_action() {
    let fixture = Fixture::new();
    fixture.transport.enqueue_error(502);
    let (action, receiver) = fixture.action("hello");

    fixture.executor(5).run(Box::new(action)).await;

    let error = receiver
        .await
        .expect("action should settle")
        .expect_err("transport failure should fail the post");
    assert!(matches!(error, ActionError::Transport { .. }));
    assert_eq!(fixture.transport.request_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn null_acks_retry_with_linear_backoff_until_confirmed() {
    let fixture = Fixture::new();
    fixture.transport.enqueue(json!({"id": null, "time": null}));
    fixture.transport.enqueue(json!({"id": null, "time": null}));
    fixture.transport.enqueue(json!({"id": 42, "time": 1000}));
    let (action, receiver) = fixture.action("hello");

    let started = tokio::time::Instant::now();
    fixture.executor(5).run(Box::new(action)).await;

    // Attempt 1 waits 1s, attempt 2 waits 2s, attempt 3 confirms.
    assert!(started.elapsed() >= Duration::from_millis(3000));
    assert_eq!(fixture.transport.request_count(), 3);

    let delivery = receiver
        .await
        .expect("action should settle")
        .expect("third attempt should succeed");
    match delivery {
        Delivery::Posted(posted) => assert_eq!(posted.message_id(), 42),
        Delivery::Superseded => panic!("expected a confirmed post"),
    }
}

#[tokio::test(start_paused = true)]
async fn persistent_null_acks_exhaust_the_budget() {
    let fixture = Fixture::new();
    for _ in 0..3 {
        fixture.transport.enqueue(json!({"id": null, "time": null}));
    }
    let (action, receiver) = fixture.action("hello");

    fixture.executor(3).run(Box::new(action)).await;

    let error = receiver
        .await
        .expect("action should settle")
        .expect_err("cap should fail the post");
    match error {
        ActionError::RetryBudgetExhausted { attempts, .. } => assert_eq!(attempts, 3),
        other => panic!("expected budget exhaustion, got {other}"),
    }
    assert_eq!(fixture.transport.request_count(), 3);
}

#[tokio::test]
async fn superseded_action_never_sends() {
    let fixture = Fixture::new();
    let (action, receiver) = fixture.action("hello");

    // A competitor takes the room slot before the executor runs.
    let newer = Arc::new(PendingMessage::new(fixture.room.clone(), "newer"));
    fixture.tracker.submit_message(newer);

    fixture.executor(5).run(Box::new(action)).await;

    let delivery = receiver
        .await
        .expect("action should settle")
        .expect("supersession is not an error");
    assert!(matches!(delivery, Delivery::Superseded));
    assert_eq!(fixture.transport.request_count(), 0);
}

#[tokio::test]
async fn attempt_cap_has_a_floor_of_one() {
    let fixture = Fixture::new();
    fixture.transport.enqueue(json!({"id": null, "time": null}));
    let (action, receiver) = fixture.action("hello");

    fixture.executor(0).run(Box::new(action)).await;

    let error = receiver
        .await
        .expect("action should settle")
        .expect_err("cap should fail the post");
    match error {
        ActionError::RetryBudgetExhausted { attempts, .. } => assert_eq!(attempts, 1),
        other => panic!("expected budget exhaustion, got {other}"),
    }
    assert_eq!(fixture.transport.request_count(), 1);
}
