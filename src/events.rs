//! Engine events and inbound commands.

use tokio::sync::broadcast;

use crate::decision::ConsentCategory;

pub(crate) const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// A handle for receiving consent change notifications.
pub type Subscription = broadcast::Receiver<ConsentEvent>;

/// Events published by the engine as consent state changes.
#[derive(Debug, Clone)]
pub enum ConsentEvent {
    /// A decision was saved (new or replacing a previous one).
    DecisionRecorded {
        category: ConsentCategory,
        analytics_enabled: bool,
    },
    /// The preferences panel became visible.
    PanelOpened,
    /// The preferences panel was hidden.
    PanelClosed,
    /// Analytics instrumentation was loaded this session.
    AnalyticsLoaded,
}

/// Commands the engine executes on behalf of external collaborators, e.g. a
/// page-level "open consent preferences" broadcast.
#[derive(Debug, Clone)]
pub enum ConsentCommand {
    OpenPanel,
}

#[derive(Debug)]
pub(crate) struct ConsentBus {
    tx: broadcast::Sender<ConsentEvent>,
}

impl Default for ConsentBus {
    fn default() -> Self {
        let (tx, _rx) = broadcast::channel(DEFAULT_CHANNEL_CAPACITY);
        Self { tx }
    }
}

impl ConsentBus {
    pub(crate) fn subscribe(&self) -> Subscription {
        self.tx.subscribe()
    }

    pub(crate) fn publish(&self, ev: ConsentEvent) {
        // send() fails only when there are 0 receivers. That's fine: if
        // nobody listens, we can ignore the error.
        let _ = self.tx.send(ev);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_reaches_subscribers() {
        let bus = ConsentBus::default();
        let mut rx = bus.subscribe();

        bus.publish(ConsentEvent::PanelOpened);
        assert!(matches!(rx.recv().await.unwrap(), ConsentEvent::PanelOpened));
    }

    #[test]
    fn publish_without_subscribers_is_fine() {
        let bus = ConsentBus::default();
        bus.publish(ConsentEvent::AnalyticsLoaded);
    }
}
