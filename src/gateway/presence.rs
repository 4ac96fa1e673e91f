use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceStatus {
    Online,
    Away,
    Offline,
}

struct Entry {
    open_connections: u32,
    last_activity: Instant,
    status: PresenceStatus,
}

/// Last-writer-wins-by-userId presence, as if backed by the shared fabric's
/// `presence` hash; here it's a process-local `DashMap` since the fabric is
/// in-process (see the gateway's fabric module).
pub struct PresenceTracker {
    entries: DashMap<i64, Entry>,
    away_after: Duration,
}

impl PresenceTracker {
    pub fn new(away_after: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            away_after,
        }
    }

    /// A connection opened for this user. Returns `Some(Online)` the first
    /// time a user goes from no connections to one, so the caller knows to
    /// publish a presence change.
    pub fn connect(&self, user_id: i64) -> Option<PresenceStatus> {
        let mut entry = self.entries.entry(user_id).or_insert_with(|| Entry {
            open_connections: 0,
            last_activity: Instant::now(),
            status: PresenceStatus::Offline,
        });
        entry.open_connections += 1;
        entry.last_activity = Instant::now();
        let was_offline = entry.status == PresenceStatus::Offline;
        entry.status = PresenceStatus::Online;
        was_offline.then_some(PresenceStatus::Online)
    }

    /// A connection closed. Returns `Some(Offline)` once the user's last
    /// connection drops.
    pub fn disconnect(&self, user_id: i64) -> Option<PresenceStatus> {
        let mut entry = self.entries.get_mut(&user_id)?;
        entry.open_connections = entry.open_connections.saturating_sub(1);
        if entry.open_connections == 0 {
            entry.status = PresenceStatus::Offline;
            return Some(PresenceStatus::Offline);
        }
        None
    }

    /// Marks the user active now (any client-originated message resets the
    /// idle clock back to `online`).
    pub fn touch(&self, user_id: i64) -> Option<PresenceStatus> {
        let mut entry = self.entries.get_mut(&user_id)?;
        entry.last_activity = Instant::now();
        if entry.status == PresenceStatus::Away {
            entry.status = PresenceStatus::Online;
            return Some(PresenceStatus::Online);
        }
        None
    }

    /// Scans for users idle longer than `away_after` and demotes them,
    /// returning the set of users whose status just changed so the caller
    /// can publish presence updates.
    pub fn sweep_idle(&self, now: Instant) -> Vec<(i64, PresenceStatus)> {
        let mut changed = Vec::new();
        for mut entry in self.entries.iter_mut() {
            if entry.status == PresenceStatus::Online
                && now.duration_since(entry.last_activity) >= self.away_after
            {
                entry.status = PresenceStatus::Away;
                changed.push((*entry.key(), PresenceStatus::Away));
            }
        }
        changed
    }

    pub fn status(&self, user_id: i64) -> PresenceStatus {
        self.entries
            .get(&user_id)
            .map(|e| e.status)
            .unwrap_or(PresenceStatus::Offline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_connection_transitions_to_online() {
        let tracker = PresenceTracker::new(Duration::from_secs(300));
        assert_eq!(tracker.connect(1), Some(PresenceStatus::Online));
        assert_eq!(tracker.connect(1), None);
    }

    #[test]
    fn last_disconnect_transitions_to_offline() {
        let tracker = PresenceTracker::new(Duration::from_secs(300));
        tracker.connect(1);
        tracker.connect(1);
        assert_eq!(tracker.disconnect(1), None);
        assert_eq!(tracker.disconnect(1), Some(PresenceStatus::Offline));
    }

    #[test]
    fn idle_sweep_demotes_online_users_past_the_threshold() {
        let tracker = PresenceTracker::new(Duration::from_millis(1));
        tracker.connect(1);
        std::thread::sleep(Duration::from_millis(5));
        let changed = tracker.sweep_idle(Instant::now());
        assert_eq!(changed, vec![(1, PresenceStatus::Away)]);
    }
}
