use tokio::sync::broadcast;
use tracing::debug;

use crate::services::activity_log::ActivityEvent;

/// Fan-out of activity events to every live subscriber.
///
/// Publishing never blocks and never fails. Subscribers only see events
/// published after they subscribed; a subscriber that falls more than the
/// channel capacity behind skips the overflow.
#[derive(Clone)]
pub struct ActivityBroadcaster {
    tx: broadcast::Sender<ActivityEvent>,
}

impl ActivityBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ActivityEvent> {
        self.tx.subscribe()
    }

    /// Publish to current subscribers. Returns how many received it.
    pub fn publish(&self, event: ActivityEvent) -> usize {
        match self.tx.send(event) {
            Ok(receivers) => receivers,
            Err(_) => {
                debug!("No live activity subscribers");
                0
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
