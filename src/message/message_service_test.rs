use std::time::Duration;

use tokio::sync::mpsc;

use super::*;
use crate::{
    error::AppError,
    message::message_models::{Attachment, AttachmentKind},
    websocket::types::ServerFrame,
};

struct Harness {
    service: MessageService,
    store: MessageStore,
    index: ConversationIndex,
    guard: BlockGuard,
    broker: SubscriptionBroker,
}

fn harness() -> Harness {
    let store = MessageStore::new();
    let index = ConversationIndex::new();
    let guard = BlockGuard::new();
    let broker = SubscriptionBroker::new(Duration::from_millis(100));
    let service = MessageService::new(
        store.clone(),
        index.clone(),
        guard.clone(),
        broker.clone(),
    );
    Harness {
        service,
        store,
        index,
        guard,
        broker,
    }
}

fn send_req(conversation_id: Uuid, sender_id: Uuid, text: &str) -> SendMessageRequest {
    SendMessageRequest {
        conversation_id,
        sender_id,
        text: text.to_string(),
        attachment: None,
    }
}

#[tokio::test]
async fn two_way_exchange_with_acknowledgement() {
    let h = harness();
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let conv = h.service.open_conversation(a, b).unwrap();

    // A sends "hi": B's summary shows it unseen, A's own row is seen.
    let message = h.service.send_message(send_req(conv.id, a, "hi")).await.unwrap();
    assert_eq!(message.sender_id, a);
    assert_eq!(message.text, "hi");

    let b_row = h.index.get(b, conv.id).unwrap();
    assert_eq!(b_row.last_message, "hi");
    assert!(!b_row.seen);
    assert!(h.index.get(a, conv.id).unwrap().seen);

    // B replies "hey": now A is the one behind.
    h.service.send_message(send_req(conv.id, b, "hey")).await.unwrap();
    let a_row = h.index.get(a, conv.id).unwrap();
    assert_eq!(a_row.last_message, "hey");
    assert!(!a_row.seen);
    assert!(h.index.get(b, conv.id).unwrap().seen);

    // A acknowledges: seen flips, last message untouched.
    h.service.mark_seen(a, conv.id).unwrap();
    let a_row = h.index.get(a, conv.id).unwrap();
    assert!(a_row.seen);
    assert_eq!(a_row.last_message, "hey");
}

#[tokio::test]
async fn blocked_send_leaves_no_trace() {
    let h = harness();
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let conv = h.service.open_conversation(a, b).unwrap();

    h.service.send_message(send_req(conv.id, a, "before")).await.unwrap();

    // B blocks A mid-conversation; the next attempt is rejected and
    // neither the log nor the summary rows move.
    h.guard.block(b, a);
    let err = h
        .service
        .send_message(send_req(conv.id, a, "after"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Blocked));

    assert_eq!(h.store.message_count(conv.id).await.unwrap(), 1);
    assert_eq!(h.index.get(b, conv.id).unwrap().last_message, "before");
}

#[tokio::test]
async fn unblock_reenables_sending() {
    let h = harness();
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let conv = h.service.open_conversation(a, b).unwrap();

    h.guard.block(a, b);
    assert!(matches!(
        h.service.send_message(send_req(conv.id, b, "hello?")).await,
        Err(AppError::Blocked)
    ));

    h.guard.unblock(a, b);
    h.service.send_message(send_req(conv.id, b, "hello!")).await.unwrap();
    assert_eq!(h.store.message_count(conv.id).await.unwrap(), 1);
}

#[tokio::test]
async fn attachment_only_message_is_accepted() {
    let h = harness();
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let conv = h.service.open_conversation(a, b).unwrap();

    let message = h
        .service
        .send_message(SendMessageRequest {
            conversation_id: conv.id,
            sender_id: a,
            text: String::new(),
            attachment: Some(Attachment {
                url: "/uploads/photo.png".to_string(),
                kind: AttachmentKind::Image,
            }),
        })
        .await
        .unwrap();

    assert!(message.attachment.is_some());
    assert!(!h.index.get(b, conv.id).unwrap().seen);
}

#[tokio::test]
async fn subscribers_receive_messages_and_summaries_in_order() {
    let h = harness();
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let conv = h.service.open_conversation(a, b).unwrap();

    let (msg_tx, mut msg_rx) = mpsc::channel(16);
    let (idx_tx, mut idx_rx) = mpsc::channel(16);
    h.broker
        .subscribe_conversation(conv.id, Uuid::new_v4(), msg_tx);
    h.broker.subscribe_index(b, Uuid::new_v4(), idx_tx);

    for text in ["one", "two", "three"] {
        h.service.send_message(send_req(conv.id, a, text)).await.unwrap();
    }

    for expected_seq in 1..=3 {
        match msg_rx.recv().await.unwrap() {
            ServerFrame::MessageAppended(msg) => assert_eq!(msg.seq, expected_seq),
            other => panic!("expected message_appended, got {other:?}"),
        }
    }

    // B's index stream saw each update, unseen from B's side.
    match idx_rx.recv().await.unwrap() {
        ServerFrame::SummaryUpdated(summary) => {
            assert_eq!(summary.user_id, b);
            assert_eq!(summary.last_message, "one");
            assert!(!summary.seen);
        }
        other => panic!("expected summary_updated, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_sends_fan_out_in_append_order() {
    let h = harness();
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let conv = h.service.open_conversation(a, b).unwrap();

    // Ample capacity so the laggard path never kicks in; every frame
    // must arrive, and strictly in sequence order.
    let (tx, mut rx) = mpsc::channel(512);
    h.broker.subscribe_conversation(conv.id, Uuid::new_v4(), tx);

    let mut handles = Vec::new();
    for task in 0..8u32 {
        let service = h.service.clone();
        let sender = if task % 2 == 0 { a } else { b };
        let conversation_id = conv.id;
        handles.push(tokio::spawn(async move {
            for i in 0..25 {
                service
                    .send_message(send_req(conversation_id, sender, &format!("{task} {i}")))
                    .await
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    for expected_seq in 1..=200u64 {
        match rx.recv().await.unwrap() {
            ServerFrame::MessageAppended(msg) => assert_eq!(
                msg.seq, expected_seq,
                "subscriber saw seq {} where seq {} was due",
                msg.seq, expected_seq
            ),
            other => panic!("expected message_appended, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn mark_seen_notifies_only_on_change() {
    let h = harness();
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let conv = h.service.open_conversation(a, b).unwrap();
    h.service.send_message(send_req(conv.id, a, "hi")).await.unwrap();

    let (idx_tx, mut idx_rx) = mpsc::channel(16);
    h.broker.subscribe_index(b, Uuid::new_v4(), idx_tx);

    h.service.mark_seen(b, conv.id).unwrap();
    match idx_rx.recv().await.unwrap() {
        ServerFrame::SummaryUpdated(summary) => assert!(summary.seen),
        other => panic!("expected summary_updated, got {other:?}"),
    }

    // Second acknowledgement is a no-op and publishes nothing.
    h.service.mark_seen(b, conv.id).unwrap();
    assert!(idx_rx.try_recv().is_err());
}

#[tokio::test]
async fn reconnect_catches_up_then_goes_live() {
    let h = harness();
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let conv = h.service.open_conversation(a, b).unwrap();

    let mut ids = Vec::new();
    for i in 1..=10 {
        let message = h
            .service
            .send_message(send_req(conv.id, a, &format!("msg {i}")))
            .await
            .unwrap();
        ids.push(message.id);
    }

    // Client disconnected after message 5; five more were appended.
    let backlog = h
        .service
        .history_since(conv.id, Some(ids[4]))
        .await
        .unwrap();
    let seqs: Vec<u64> = backlog.iter().map(|m| m.seq).collect();
    assert_eq!(seqs, vec![6, 7, 8, 9, 10]);

    // Resubscribed: the next append arrives as a live frame.
    let (tx, mut rx) = mpsc::channel(16);
    h.broker.subscribe_conversation(conv.id, Uuid::new_v4(), tx);
    h.service.send_message(send_req(conv.id, b, "msg 11")).await.unwrap();

    match rx.recv().await.unwrap() {
        ServerFrame::MessageAppended(msg) => {
            assert_eq!(msg.seq, 11);
            assert_eq!(msg.text, "msg 11");
        }
        other => panic!("expected message_appended, got {other:?}"),
    }
}
