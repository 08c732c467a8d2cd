use tokio::sync::broadcast;

use crate::error::AppError;
use crate::protocol::Event;
use crate::traits::Notifier;

const DEFAULT_CAPACITY: usize = 64;

/// Fans `PARTICIPANTS_UPDATED` events out to every current subscriber.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    tx: broadcast::Sender<Event>,
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Notifier for BroadcastNotifier {
    async fn notify(&self, participants: &[String]) -> Result<(), AppError> {
        let event = Event::ParticipantsUpdated {
            participants: participants.to_vec(),
        };
        match self.tx.send(event) {
            Ok(receivers) => tracing::debug!(receivers, "Pushed participant update"),
            Err(_) => tracing::debug!("No subscribers for participant update"),
        }
        Ok(())
    }
}
