pub mod hand_state;
pub mod serialization;

use crate::model::ids::HandId;
use hand_state::HandEvent;
use std::sync::mpsc::Sender;
use tracing::{Level, event};

/// Receives every event a hand emits. Notification is fire-and-forget: a
/// failing observer never affects the hand.
pub trait HandObserver: Send + Sync {
    fn notify(&self, hand: HandId, event: &HandEvent);
}

impl<F> HandObserver for F
where
    F: Fn(HandId, &HandEvent) + Send + Sync,
{
    fn notify(&self, hand: HandId, event: &HandEvent) {
        self(hand, event)
    }
}

impl HandObserver for Sender<(HandId, HandEvent)> {
    fn notify(&self, hand: HandId, event: &HandEvent) {
        // A dropped receiver just means nobody is listening any more.
        let _ = self.send((hand, event.clone()));
    }
}

/// Forwards hand events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl HandObserver for TracingObserver {
    fn notify(&self, hand: HandId, event: &HandEvent) {
        event!(
            target: "bridge_core::hand",
            Level::DEBUG,
            hand = %hand,
            event = ?event,
        );
    }
}
