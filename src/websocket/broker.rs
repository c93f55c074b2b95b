use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{
    conversation::conversation_models::ConversationSummary,
    message::message_models::Message,
    websocket::types::ServerFrame,
};

/// Outbound channel of one connected socket.
pub type FrameSender = mpsc::Sender<ServerFrame>;

#[derive(Clone)]
struct Subscriber {
    id: Uuid,
    tx: FrameSender,
}

/// Fans change notifications out to live subscribers.
///
/// Delivery is decoupled from the append path: a publish first attempts a
/// non-blocking `try_send`; when a subscriber's channel is full, the send
/// is retried on a spawned task with a bounded timeout, after which the
/// subscriber is dropped and logged. Publishing never blocks the writer
/// and delivery failures never reach it.
#[derive(Clone)]
pub struct SubscriptionBroker {
    /// Conversation-level subscribers, keyed by conversation id.
    conversation_subs: Arc<DashMap<Uuid, Vec<Subscriber>>>,
    /// Index-level subscribers, keyed by the watched user id.
    index_subs: Arc<DashMap<Uuid, Vec<Subscriber>>>,
    delivery_timeout: Duration,
}

impl SubscriptionBroker {
    pub fn new(delivery_timeout: Duration) -> Self {
        Self {
            conversation_subs: Arc::new(DashMap::new()),
            index_subs: Arc::new(DashMap::new()),
            delivery_timeout,
        }
    }

    /// Subscribe a connected socket to every message appended to a
    /// conversation. Backlog catch-up is the caller's concern (pull via
    /// `read_since` before going live).
    pub fn subscribe_conversation(
        &self,
        conversation_id: Uuid,
        subscriber_id: Uuid,
        tx: FrameSender,
    ) {
        let mut subs = self.conversation_subs.entry(conversation_id).or_default();
        if !subs.iter().any(|s| s.id == subscriber_id) {
            subs.push(Subscriber {
                id: subscriber_id,
                tx,
            });
        }
    }

    /// Subscribe a connected socket to a user's summary-row changes.
    pub fn subscribe_index(&self, user_id: Uuid, subscriber_id: Uuid, tx: FrameSender) {
        let mut subs = self.index_subs.entry(user_id).or_default();
        if !subs.iter().any(|s| s.id == subscriber_id) {
            subs.push(Subscriber {
                id: subscriber_id,
                tx,
            });
        }
    }

    /// Remove a socket from every subscription list. Called on socket
    /// close and on delivery failure.
    pub fn unsubscribe(&self, subscriber_id: Uuid) {
        for mut entry in self.conversation_subs.iter_mut() {
            entry.value_mut().retain(|s| s.id != subscriber_id);
        }
        for mut entry in self.index_subs.iter_mut() {
            entry.value_mut().retain(|s| s.id != subscriber_id);
        }
    }

    /// Push a newly appended message to every live subscriber of its
    /// conversation, in append order.
    pub fn publish_message(&self, message: &Message) {
        let frame = ServerFrame::MessageAppended(message.clone().into());
        if let Some(mut subs) = self.conversation_subs.get_mut(&message.conversation_id) {
            self.deliver(&mut subs, frame);
        }
    }

    /// Push an updated summary row to every subscriber watching its
    /// owner's index.
    pub fn publish_summary(&self, summary: &ConversationSummary) {
        let frame = ServerFrame::SummaryUpdated(summary.clone());
        if let Some(mut subs) = self.index_subs.get_mut(&summary.user_id) {
            self.deliver(&mut subs, frame);
        }
    }

    fn deliver(&self, subs: &mut Vec<Subscriber>, frame: ServerFrame) {
        subs.retain(|sub| match sub.tx.try_send(frame.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(subscriber_id = %sub.id, "subscriber gone, dropping");
                false
            }
            Err(mpsc::error::TrySendError::Full(frame)) => {
                // Slow consumer. It is removed from this list right away
                // so later frames cannot overtake the retried one; the
                // retry itself happens off the write path, bounded by the
                // delivery timeout. The client recovers the stream by
                // resubscribing with its last known message id.
                let broker = self.clone();
                let sub = sub.clone();
                let timeout = self.delivery_timeout;
                tokio::spawn(async move {
                    match tokio::time::timeout(timeout, sub.tx.send(frame)).await {
                        Ok(Ok(())) => {
                            tracing::debug!(
                                subscriber_id = %sub.id,
                                "lagging subscriber dropped from stream after final delivery"
                            );
                        }
                        _ => {
                            tracing::warn!(
                                subscriber_id = %sub.id,
                                "subscriber unreachable within retry window, dropping"
                            );
                            broker.unsubscribe(sub.id);
                        }
                    }
                });
                false
            }
        });
    }

    /// Number of live subscribers on a conversation.
    #[allow(dead_code)]
    pub fn conversation_subscriber_count(&self, conversation_id: Uuid) -> usize {
        self.conversation_subs
            .get(&conversation_id)
            .map_or(0, |subs| subs.len())
    }
}

#[cfg(test)]
#[path = "broker_test.rs"]
mod broker_test;
