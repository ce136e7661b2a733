use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use uuid::Uuid;

const DEFAULT_CAPACITY: usize = 64;

/// A committed mutation, as announced to listeners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ChangeEvent {
    EventCreated { event_id: Uuid },
    EventDeleted { event_id: Uuid },
    ContentAdded { event_id: Uuid, content_id: Uuid },
    ContentRemoved { event_id: Uuid, content_id: Uuid },
}

impl ChangeEvent {
    pub fn event_id(&self) -> Uuid {
        match self {
            Self::EventCreated { event_id }
            | Self::EventDeleted { event_id }
            | Self::ContentAdded { event_id, .. }
            | Self::ContentRemoved { event_id, .. } => *event_id,
        }
    }
}

/// In-process fan-out of [`ChangeEvent`]s.
#[derive(Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn publish(&self, change: ChangeEvent) {
        // No listeners is fine.
        let delivered = self.sender.send(change.clone()).unwrap_or(0);
        tracing::debug!(?change, delivered, "Change published");
    }

    /// Raw receiver, for consumers that drive their own loop.
    pub fn receiver(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }

    /// Invokes `on_change` for every change published after this call until the
    /// returned [`Subscription`] is unsubscribed or dropped.
    pub fn subscribe<F>(&self, on_change: F) -> Subscription
    where
        F: Fn(ChangeEvent) + Send + 'static,
    {
        let mut receiver = self.sender.subscribe();
        let handle = tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(change) => on_change(change),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Change listener lagged behind");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
        Subscription { handle }
    }

    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Handle returned by [`ChangeFeed::subscribe`].
pub struct Subscription {
    handle: JoinHandle<()>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        // Drop does the work.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn created() -> ChangeEvent {
        ChangeEvent::EventCreated { event_id: Uuid::new_v4() }
    }

    #[tokio::test]
    async fn subscriber_receives_published_changes() {
        let feed = ChangeFeed::default();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _subscription = feed.subscribe(move |change| {
            let _ = tx.send(change);
        });

        let change = created();
        feed.publish(change.clone());

        let received = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await.unwrap();
        assert_eq!(received, Some(change));
    }

    #[tokio::test]
    async fn unsubscribe_stops_delivery() {
        let feed = ChangeFeed::default();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let subscription = feed.subscribe(move |change| {
            let _ = tx.send(change);
        });

        subscription.unsubscribe();
        tokio::task::yield_now().await;
        feed.publish(created());

        // Sender is dropped with the aborted task, so the channel closes empty.
        let received = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await.unwrap();
        assert_eq!(received, None);
    }

    #[test]
    fn publishing_without_listeners_is_harmless() {
        let feed = ChangeFeed::new(4);
        feed.publish(created());
        assert_eq!(feed.listener_count(), 0);
    }

    #[test]
    fn changes_serialize_with_type_tag() {
        let event_id = Uuid::nil();
        let json = serde_json::to_value(ChangeEvent::ContentRemoved { event_id, content_id: event_id }).unwrap();
        assert_eq!(json["type"], "contentRemoved");
        assert_eq!(json["eventId"], event_id.to_string());
        assert_eq!(json["contentId"], event_id.to_string());
    }
}
