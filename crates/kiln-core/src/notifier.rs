//! Live-update notifications.
//!
//! The session publishes one [`LiveEvent`] per lifecycle step. Whatever
//! carries them to browsers (SSE, websockets) subscribes here; the wire format
//! is theirs to choose.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;

/// Default number of events buffered per subscriber.
pub const DEFAULT_CAPACITY: usize = 64;

/// Events in the develop lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LiveEvent {
    /// A round started compiling
    BuildStarted,
    /// A round completed successfully
    BuildSucceeded { duration_ms: u64 },
    /// A round failed
    BuildFailed { errors: Vec<String> },
    /// Page data for these templates is being rewritten
    StaticQueriesChanged { templates: Vec<String> },
}

/// Cheaply cloneable broadcast handle.
#[derive(Debug, Clone)]
pub struct LiveUpdateNotifier {
    tx: broadcast::Sender<LiveEvent>,
}

impl LiveUpdateNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Receive every event sent from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<LiveEvent> {
        self.tx.subscribe()
    }

    /// Publish an event, returning how many subscribers got it.
    pub fn send(&self, event: LiveEvent) -> usize {
        trace!(?event, "live update");
        // No subscribers is fine
        self.tx.send(event).unwrap_or(0)
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for LiveUpdateNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_all_subscribers_receive_events() {
        let notifier = LiveUpdateNotifier::default();
        let mut first = notifier.subscribe();
        let mut second = notifier.subscribe();
        assert_eq!(notifier.receiver_count(), 2);

        let delivered = notifier.send(LiveEvent::BuildSucceeded { duration_ms: 42 });
        assert_eq!(delivered, 2);

        assert_eq!(first.recv().await.unwrap(), LiveEvent::BuildSucceeded { duration_ms: 42 });
        assert_eq!(second.recv().await.unwrap(), LiveEvent::BuildSucceeded { duration_ms: 42 });
    }

    #[test]
    fn test_send_without_subscribers() {
        let notifier = LiveUpdateNotifier::new(4);
        assert_eq!(notifier.send(LiveEvent::BuildStarted), 0);
    }

    #[test]
    fn test_event_json_is_tagged() {
        let json = serde_json::to_string(&LiveEvent::BuildFailed {
            errors: vec!["boom".to_string()],
        })
        .unwrap();
        assert!(json.contains(r#""type":"BuildFailed""#));
        assert!(json.contains("boom"));
    }
}
