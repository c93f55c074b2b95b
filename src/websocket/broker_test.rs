use super::*;
use chrono::Utc;

fn broker() -> SubscriptionBroker {
    SubscriptionBroker::new(Duration::from_millis(50))
}

fn message(conversation_id: Uuid, seq: u64, text: &str) -> Message {
    Message {
        id: Uuid::new_v4(),
        conversation_id,
        sender_id: Uuid::new_v4(),
        text: text.to_string(),
        attachment: None,
        seq,
        created_at: Utc::now(),
    }
}

fn summary(user_id: Uuid) -> ConversationSummary {
    ConversationSummary {
        conversation_id: Uuid::new_v4(),
        user_id,
        peer_id: Uuid::new_v4(),
        last_message: "hello".to_string(),
        last_message_at: Utc::now(),
        seen: false,
    }
}

#[tokio::test]
async fn delivers_messages_in_publish_order() {
    let broker = broker();
    let conversation_id = Uuid::new_v4();
    let (tx, mut rx) = mpsc::channel(8);
    broker.subscribe_conversation(conversation_id, Uuid::new_v4(), tx);

    for seq in 1..=3 {
        broker.publish_message(&message(conversation_id, seq, "m"));
    }

    for expected in 1..=3 {
        match rx.recv().await.unwrap() {
            ServerFrame::MessageAppended(msg) => assert_eq!(msg.seq, expected),
            other => panic!("expected message_appended, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn publishes_reach_only_that_conversations_subscribers() {
    let broker = broker();
    let watched = Uuid::new_v4();
    let other = Uuid::new_v4();
    let (tx, mut rx) = mpsc::channel(8);
    broker.subscribe_conversation(watched, Uuid::new_v4(), tx);

    broker.publish_message(&message(other, 1, "elsewhere"));
    assert!(rx.try_recv().is_err());

    broker.publish_message(&message(watched, 1, "here"));
    assert!(matches!(
        rx.recv().await.unwrap(),
        ServerFrame::MessageAppended(_)
    ));
}

#[tokio::test]
async fn summary_updates_reach_only_the_owners_watchers() {
    let broker = broker();
    let (user_a, user_b) = (Uuid::new_v4(), Uuid::new_v4());
    let (tx, mut rx) = mpsc::channel(8);
    broker.subscribe_index(user_a, Uuid::new_v4(), tx);

    broker.publish_summary(&summary(user_b));
    assert!(rx.try_recv().is_err());

    broker.publish_summary(&summary(user_a));
    match rx.recv().await.unwrap() {
        ServerFrame::SummaryUpdated(s) => assert_eq!(s.user_id, user_a),
        other => panic!("expected summary_updated, got {other:?}"),
    }
}

#[tokio::test]
async fn resubscribing_the_same_socket_is_a_single_subscription() {
    let broker = broker();
    let conversation_id = Uuid::new_v4();
    let subscriber_id = Uuid::new_v4();
    let (tx, _rx) = mpsc::channel(8);

    broker.subscribe_conversation(conversation_id, subscriber_id, tx.clone());
    broker.subscribe_conversation(conversation_id, subscriber_id, tx);

    assert_eq!(broker.conversation_subscriber_count(conversation_id), 1);
}

#[tokio::test]
async fn closed_receiver_is_dropped_on_publish() {
    let broker = broker();
    let conversation_id = Uuid::new_v4();
    let (tx, rx) = mpsc::channel(8);
    broker.subscribe_conversation(conversation_id, Uuid::new_v4(), tx);
    drop(rx);

    broker.publish_message(&message(conversation_id, 1, "into the void"));
    assert_eq!(broker.conversation_subscriber_count(conversation_id), 0);
}

#[tokio::test]
async fn unsubscribe_removes_the_socket_everywhere() {
    let broker = broker();
    let subscriber_id = Uuid::new_v4();
    let conversation_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();
    let (tx, mut rx) = mpsc::channel(8);

    broker.subscribe_conversation(conversation_id, subscriber_id, tx.clone());
    broker.subscribe_index(user_id, subscriber_id, tx);
    broker.unsubscribe(subscriber_id);

    broker.publish_message(&message(conversation_id, 1, "gone"));
    broker.publish_summary(&summary(user_id));
    assert!(rx.try_recv().is_err());
    assert_eq!(broker.conversation_subscriber_count(conversation_id), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn slow_subscriber_never_blocks_the_publisher() {
    let broker = broker();
    let conversation_id = Uuid::new_v4();
    // Capacity 1 and nobody consuming: the second publish hits a full
    // channel.
    let (tx, mut rx) = mpsc::channel(1);
    broker.subscribe_conversation(conversation_id, Uuid::new_v4(), tx);

    let started = std::time::Instant::now();
    for seq in 1..=5 {
        broker.publish_message(&message(conversation_id, seq, "burst"));
    }
    // All five publishes return without waiting on the subscriber.
    assert!(started.elapsed() < Duration::from_millis(500));

    // The laggard was removed from the live stream.
    assert_eq!(broker.conversation_subscriber_count(conversation_id), 0);

    // Whatever did arrive is still strictly in order.
    let mut last_seq = 0;
    while let Ok(frame) = rx.try_recv() {
        if let ServerFrame::MessageAppended(msg) = frame {
            assert!(msg.seq > last_seq);
            last_seq = msg.seq;
        }
    }
}
