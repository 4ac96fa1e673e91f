use std::collections::HashSet;

use dashmap::DashMap;

use super::protocol::{ChannelKey, ConnectionId};

/// The local mirror of the global Subscription Index: which connections on
/// *this* instance care about a given channel. Writes to the cross-instance
/// index happen on the fabric; this mirror is what the hot fan-out path
/// reads so delivery never needs a network hop.
#[derive(Default)]
pub struct SubscriptionRouter {
    by_channel: DashMap<ChannelKey, HashSet<ConnectionId>>,
    by_connection: DashMap<ConnectionId, HashSet<ChannelKey>>,
}

impl SubscriptionRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent: subscribing twice to the same channel is a no-op.
    pub fn subscribe(&self, connection_id: ConnectionId, channel: ChannelKey) {
        self.by_channel
            .entry(channel.clone())
            .or_default()
            .insert(connection_id);
        self.by_connection
            .entry(connection_id)
            .or_default()
            .insert(channel);
    }

    pub fn unsubscribe(&self, connection_id: ConnectionId, channel: &ChannelKey) {
        if let Some(mut subs) = self.by_channel.get_mut(channel) {
            subs.remove(&connection_id);
        }
        if let Some(mut channels) = self.by_connection.get_mut(&connection_id) {
            channels.remove(channel);
        }
    }

    pub fn is_subscribed(&self, connection_id: ConnectionId, channel: &ChannelKey) -> bool {
        self.by_channel
            .get(channel)
            .map(|subs| subs.contains(&connection_id))
            .unwrap_or(false)
    }

    /// Removes every subscription owned by a connection, e.g. on socket
    /// close. Returns the channels it was subscribed to.
    pub fn drop_connection(&self, connection_id: ConnectionId) -> Vec<ChannelKey> {
        let Some((_, channels)) = self.by_connection.remove(&connection_id) else {
            return Vec::new();
        };
        for channel in &channels {
            if let Some(mut subs) = self.by_channel.get_mut(channel) {
                subs.remove(&connection_id);
            }
        }
        channels.into_iter().collect()
    }

    pub fn subscribers(&self, channel: &ChannelKey) -> Vec<ConnectionId> {
        self.by_channel
            .get(channel)
            .map(|subs| subs.iter().copied().collect())
            .unwrap_or_default()
    }
}
