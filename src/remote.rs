//! Collaborator seams for everything the engine does not own.
//!
//! The engine never speaks a wire protocol itself: cluster metadata, offset
//! stores, the alarm configuration store, the notification transport, and
//! the persistence sink are all reached through these traits. Hosts wire in
//! real clients; tests wire in in-memory fakes.

use crate::domain::{AlarmRule, BrokerEndpoint, GroupMembership, TopicGroupAggregate};
use crate::error::Result;
use async_trait::async_trait;

/// Cluster metadata service: broker discovery, partition listing, and log
/// end offsets.
#[async_trait]
pub trait ClusterMetadata: Send + Sync {
    /// List broker endpoints for a cluster, in broker-id order.
    async fn list_brokers(&self, cluster: &str) -> Result<Vec<BrokerEndpoint>>;

    /// List partition ids for a topic.
    async fn list_partitions(&self, cluster: &str, topic: &str) -> Result<Vec<i32>>;

    /// The next offset to be written to a partition, i.e. its size in
    /// message-offset units.
    async fn log_end_offset(
        &self,
        brokers: &[BrokerEndpoint],
        topic: &str,
        partition: i32,
    ) -> Result<i64>;
}

/// One committed-offset record as the coordination store reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedOffsetRecord {
    pub offset: i64,
    pub owner: String,
    pub committed_at_ms: i64,
}

/// Coordination store holding committed offsets outside the cluster
/// (the `external` offset-storage variant).
#[async_trait]
pub trait CoordinationStore: Send + Sync {
    /// The committed offset for exactly one (topic, group, partition)
    /// triple, or `None` when no commit has ever been recorded.
    async fn committed_offset(
        &self,
        cluster: &str,
        topic: &str,
        group: &str,
        partition: i32,
    ) -> Result<Option<CommittedOffsetRecord>>;

    /// Group → topics mapping derived from the store's watch paths.
    async fn list_groups(&self, cluster: &str) -> Result<GroupMembership>;
}

/// Remote collector that tails the cluster's reserved offsets topic and
/// serves snapshots over request/response (the `native` offset-storage
/// variant). Payloads are serialized JSON; the engine deserializes and
/// filters them.
#[async_trait]
pub trait CollectorClient: Send + Sync {
    /// Snapshot of every committed offset the collector has observed.
    async fn offset_snapshot(&self, cluster: &str) -> Result<String>;

    /// Snapshot of every active group → topics relationship.
    async fn group_snapshot(&self, cluster: &str) -> Result<String>;
}

/// Alarm configuration store. Rules are re-read every cycle so edits take
/// effect on the next tick.
#[async_trait]
pub trait AlarmStore: Send + Sync {
    async fn alarm_rules(&self, cluster: &str) -> Result<Vec<AlarmRule>>;
}

/// Notification transport (mail, webhook, ...).
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipients: &str, subject: &str, body: &str) -> Result<()>;
}

/// Persistence sink for cycle aggregates. The storage format is the sink's
/// business.
#[async_trait]
pub trait AggregateSink: Send + Sync {
    async fn insert(&self, cluster: &str, aggregates: &[TopicGroupAggregate]) -> Result<()>;
}
