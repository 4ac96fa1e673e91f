use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::broadcast;

use super::protocol::{ChannelKey, FabricEnvelope};

/// The seam between gateway logic and the shared pub/sub fabric named in the
/// concurrency model. A networked implementation (a reconnecting client in
/// the shape of the table-feed realtime client) could stand in for this
/// without touching any other gateway module; the one shipped here is
/// in-process, since no external broker crate exists in this codebase's
/// dependency lineage and a single process already satisfies the ordering
/// guarantees this core needs.
#[async_trait]
pub trait FabricClient: Send + Sync {
    async fn publish(&self, envelope: FabricEnvelope) -> anyhow::Result<()>;
    fn subscribe(&self) -> broadcast::Receiver<FabricEnvelope>;
    /// Next monotonic sequence number for a `{channel, scopeId}` pair.
    fn next_seq(&self, channel: &ChannelKey) -> u64;
}

/// `DashMap`-backed fan-out: one broadcast channel shared by every channel
/// key, mirroring "all gateway instances subscribe to a single well-known
/// channel" — here that channel is simply process-wide.
pub struct InProcessFabric {
    bus: broadcast::Sender<FabricEnvelope>,
    seq_counters: DashMap<ChannelKey, u64>,
}

impl InProcessFabric {
    pub fn new(capacity: usize) -> Self {
        let (bus, _) = broadcast::channel(capacity);
        Self {
            bus,
            seq_counters: DashMap::new(),
        }
    }
}

#[async_trait]
impl FabricClient for InProcessFabric {
    async fn publish(&self, envelope: FabricEnvelope) -> anyhow::Result<()> {
        // No subscribers is not an error: a channel nobody is listening to
        // yet simply drops the envelope, same as a real broker would fan
        // out to zero consumers.
        let _ = self.bus.send(envelope);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<FabricEnvelope> {
        self.bus.subscribe()
    }

    fn next_seq(&self, channel: &ChannelKey) -> u64 {
        let mut counter = self.seq_counters.entry(channel.clone()).or_insert(0);
        *counter += 1;
        *counter
    }
}
