use crate::domain::BrokerEndpoint;
use crate::error::Result;
use crate::remote::ClusterMetadata;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

#[derive(Debug, Clone)]
struct CacheEntry {
    brokers: Vec<BrokerEndpoint>,
    captured_at: Instant,
}

/// TTL-bound cache of broker endpoint sets, keyed by cluster alias.
///
/// Broker sets rarely change, so a stale hit still serves the cached value
/// and only evicts the entry; the next caller pays for the re-fetch. A miss
/// fetches live metadata; if that fails the call fails, no stale fallback.
pub struct BrokerMetadataCache {
    metadata: Arc<dyn ClusterMetadata>,
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl BrokerMetadataCache {
    pub fn new(metadata: Arc<dyn ClusterMetadata>, ttl: Duration) -> Self {
        Self {
            metadata,
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Broker endpoints for a cluster, cached up to the configured TTL.
    #[instrument(skip(self))]
    pub async fn brokers(&self, cluster: &str) -> Result<Vec<BrokerEndpoint>> {
        if let Some(entry) = self.entries.get(cluster) {
            let brokers = entry.brokers.clone();
            let stale = entry.captured_at.elapsed() >= self.ttl;
            drop(entry);

            if stale {
                // Serve the stale value one last time; the next caller
                // re-fetches against an empty slot.
                self.entries.remove(cluster);
                debug!(cluster, "Evicted stale broker metadata entry");
            }
            return Ok(brokers);
        }

        let brokers = self.metadata.list_brokers(cluster).await?;
        debug!(
            cluster,
            brokers = brokers.len(),
            "Fetched live broker metadata"
        );
        self.entries.insert(
            cluster.to_string(),
            CacheEntry {
                brokers: brokers.clone(),
                captured_at: Instant::now(),
            },
        );
        Ok(brokers)
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl std::fmt::Debug for BrokerMetadataCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrokerMetadataCache")
            .field("entries", &self.entries.len())
            .field("ttl", &self.ttl)
            .finish()
    }
}
