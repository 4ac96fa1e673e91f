use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use tokio::sync::mpsc;

use super::protocol::{ConnectionId, ServerMessage};

/// Connection lifecycle state, matching the contract in the gateway's
/// component design: connecting -> authenticated -> subscribed -> (draining)
/// -> closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionPhase {
    Connecting,
    Authenticated,
    Subscribed,
    Draining,
    Closed,
}

pub struct Connection {
    pub user_id: i64,
    pub instance_id: String,
    pub opened_at: Instant,
    pub last_pong: Instant,
    pub phase: ConnectionPhase,
    outbound: mpsc::Sender<ServerMessage>,
    backpressured: Arc<AtomicBool>,
}

/// Per-instance map of sockets. An entry's `outbound` sender feeds that
/// socket's write task; the bound on the channel is the backpressure limit
/// by message count (the byte-size bound is enforced by the caller tracking
/// bytes actually queued, since `mpsc` only bounds item count).
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, Connection>,
    queue_capacity: usize,
}

impl ConnectionRegistry {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            connections: DashMap::new(),
            queue_capacity,
        }
    }

    /// Registers a new socket and returns its outbound receiver (drained by
    /// the connection's write pump) plus a shared flag the write pump checks
    /// when that receiver closes, to tell a backpressure close apart from an
    /// ordinary one.
    pub fn register(
        &self,
        connection_id: ConnectionId,
        user_id: i64,
        instance_id: String,
    ) -> (mpsc::Receiver<ServerMessage>, Arc<AtomicBool>) {
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        let backpressured = Arc::new(AtomicBool::new(false));
        let now = Instant::now();
        self.connections.insert(
            connection_id,
            Connection {
                user_id,
                instance_id,
                opened_at: now,
                last_pong: now,
                phase: ConnectionPhase::Connecting,
                outbound: tx,
                backpressured: Arc::clone(&backpressured),
            },
        );
        (rx, backpressured)
    }

    pub fn set_phase(&self, connection_id: ConnectionId, phase: ConnectionPhase) {
        if let Some(mut conn) = self.connections.get_mut(&connection_id) {
            conn.phase = phase;
        }
    }

    pub fn touch_pong(&self, connection_id: ConnectionId) {
        if let Some(mut conn) = self.connections.get_mut(&connection_id) {
            conn.last_pong = Instant::now();
        }
    }

    pub fn user_of(&self, connection_id: ConnectionId) -> Option<i64> {
        self.connections.get(&connection_id).map(|c| c.user_id)
    }

    /// Best-effort delivery to one socket. Returns `Err` (the message is
    /// dropped) if the socket's outbound queue is already full, signaling
    /// the caller should close with `backpressure`.
    pub fn try_send(&self, connection_id: ConnectionId, message: ServerMessage) -> Result<(), ()> {
        let Some(conn) = self.connections.get(&connection_id) else {
            return Err(());
        };
        conn.outbound.try_send(message).map_err(|_| ())
    }

    pub fn remove(&self, connection_id: ConnectionId) {
        self.connections.remove(&connection_id);
    }

    /// Drops a connection's entry (closing its outbound channel) and flags
    /// it as backpressure-closed so its write pump sends the `backpressure`
    /// close code instead of a plain one once the channel drains.
    pub fn mark_backpressured(&self, connection_id: ConnectionId) {
        if let Some((_, conn)) = self.connections.remove(&connection_id) {
            conn.backpressured.store(true, Ordering::SeqCst);
        }
    }

    /// Connections whose last pong is older than `timeout` relative to
    /// `now` — scanned periodically by the heartbeat supervisor's reaper.
    pub fn stale_connections(&self, now: Instant, timeout: std::time::Duration) -> Vec<ConnectionId> {
        self.connections
            .iter()
            .filter(|entry| now.duration_since(entry.last_pong) >= timeout)
            .map(|entry| *entry.key())
            .collect()
    }

    pub fn all_connection_ids(&self) -> Vec<ConnectionId> {
        self.connections.iter().map(|e| *e.key()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_then_remove_round_trips_cleanly() {
        let registry = ConnectionRegistry::new(4);
        let id = ConnectionId::new_v4();
        let (_rx, _backpressured) = registry.register(id, 1, "gw-1".to_string());
        assert_eq!(registry.user_of(id), Some(1));
        registry.remove(id);
        assert_eq!(registry.user_of(id), None);
    }

    #[test]
    fn mark_backpressured_closes_the_channel_and_flags_the_cause() {
        let registry = ConnectionRegistry::new(4);
        let id = ConnectionId::new_v4();
        let (_rx, backpressured) = registry.register(id, 1, "gw-1".to_string());
        registry.mark_backpressured(id);
        assert!(backpressured.load(Ordering::SeqCst));
        assert_eq!(registry.user_of(id), None);
    }

    #[test]
    fn try_send_fails_once_the_bounded_queue_is_full() {
        let registry = ConnectionRegistry::new(1);
        let id = ConnectionId::new_v4();
        let (_rx, _backpressured) = registry.register(id, 1, "gw-1".to_string());
        assert!(registry.try_send(id, ServerMessage::Pong).is_ok());
        assert!(registry.try_send(id, ServerMessage::Pong).is_err());
    }
}
