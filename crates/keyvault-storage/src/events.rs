//! Change notification for store mutations.
//!
//! Consumers that render derived views (lists, stats, suggestion sets)
//! subscribe once and re-query after each event. The bus is owned by the
//! storage layer; there is no process-global state.

use tokio::sync::broadcast;

const BUFFER_CAPACITY: usize = 64;

/// A committed mutation of the key collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEvent {
    Created { id: u64 },
    Updated { id: u64 },
    Deleted { id: u64 },
    /// The whole collection was replaced by an import.
    Replaced,
}

/// Broadcast bus handing out receivers to interested consumers.
#[derive(Debug, Clone)]
pub struct ChangeBus {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeBus {
    pub(crate) fn new() -> Self {
        let (sender, _receiver) = broadcast::channel(BUFFER_CAPACITY);
        Self { sender }
    }

    /// Subscribe to mutation events.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }

    /// Publish an event. Lagging or absent subscribers are not an error.
    pub(crate) fn publish(&self, event: ChangeEvent) {
        let _ = self.sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribers_receive_published_events() {
        let bus = ChangeBus::new();
        let mut receiver = bus.subscribe();

        bus.publish(ChangeEvent::Created { id: 7 });

        assert_eq!(receiver.try_recv().unwrap(), ChangeEvent::Created { id: 7 });
    }

    #[test]
    fn publish_without_subscribers_is_a_no_op() {
        let bus = ChangeBus::new();
        bus.publish(ChangeEvent::Replaced);
    }
}
