//! Named-channel event bus used to fan events out to room, display, and
//! per-player audiences.
//!
//! Channels are created lazily on first subscription and dropped again once
//! the last subscriber disconnects. Delivery is best-effort: events are
//! signals telling consumers to re-fetch authoritative state, so a publish
//! with no listeners (or a lagged receiver) is never an error.

use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::dto::sse::ServerEvent;

/// Channel carrying room-wide events (joins, leaves, game start).
pub fn room_channel(room_id: Uuid) -> String {
    format!("game-{room_id}")
}

/// Channel carrying display-only events (phase changes, game end).
pub fn display_channel(room_id: Uuid) -> String {
    format!("game-{room_id}_display")
}

/// Channel private to a single player.
pub fn player_channel(room_id: Uuid, player_id: Uuid) -> String {
    format!("game-{room_id}_{player_id}")
}

/// Broadcast hub multiplexing many named channels.
pub struct EventBus {
    capacity: usize,
    channels: DashMap<String, broadcast::Sender<ServerEvent>>,
}

impl EventBus {
    /// Create a bus whose per-channel buffers hold `capacity` events.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            channels: DashMap::new(),
        }
    }

    /// Register a subscriber on a channel, creating the channel on demand.
    pub fn subscribe(&self, channel: &str) -> broadcast::Receiver<ServerEvent> {
        self.channels
            .entry(channel.to_owned())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Send an event to every current subscriber of a channel. Channels with
    /// no remaining subscribers are pruned instead of buffering.
    pub fn publish(&self, channel: &str, event: ServerEvent) {
        let Some(sender) = self.channels.get(channel).map(|entry| entry.clone()) else {
            return;
        };

        if sender.send(event).is_err() {
            // Last receiver went away; forget the channel.
            self.channels
                .remove_if(channel, |_, sender| sender.receiver_count() == 0);
        }
    }

    /// Number of live channels, exposed for tests and diagnostics.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}
