use crate::domain::{GroupMembership, PartitionOffsetFact};
use crate::error::{LagmonError, Result};
use crate::remote::CollectorClient;
use crate::source::OffsetSource;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;

/// One committed-offset record as serialized by the remote collector.
/// `offset == -1` is the collector's sentinel for "no commit observed yet";
/// it is translated to `None` here and goes no further.
#[derive(Debug, Clone, Deserialize)]
struct CollectorOffsetRecord {
    topic: String,
    group: String,
    partition: i32,
    offset: i64,
    #[serde(default)]
    timestamp: i64,
    #[serde(default)]
    owner: String,
}

/// Offset source for clusters that keep committed offsets in their reserved
/// internal topic. A remote collector tails that topic and serves full
/// snapshots; each lookup deserializes the snapshot and linearly filters for
/// the requested triple.
pub struct NativeOffsetSource {
    collector: Arc<dyn CollectorClient>,
}

impl NativeOffsetSource {
    pub fn new(collector: Arc<dyn CollectorClient>) -> Self {
        Self { collector }
    }

    fn parse_offset_snapshot(payload: &str) -> Result<Vec<CollectorOffsetRecord>> {
        serde_json::from_str(payload).map_err(|e| {
            LagmonError::OffsetSourceUnavailable(format!(
                "malformed collector offset snapshot: {}",
                e
            ))
        })
    }

    fn parse_group_snapshot(payload: &str) -> Result<GroupMembership> {
        serde_json::from_str(payload).map_err(|e| {
            LagmonError::OffsetSourceUnavailable(format!(
                "malformed collector group snapshot: {}",
                e
            ))
        })
    }
}

#[async_trait]
impl OffsetSource for NativeOffsetSource {
    #[instrument(skip(self))]
    async fn committed_offset(
        &self,
        cluster: &str,
        topic: &str,
        group: &str,
        partition: i32,
    ) -> Result<PartitionOffsetFact> {
        let payload = self.collector.offset_snapshot(cluster).await?;
        let records = Self::parse_offset_snapshot(&payload)?;

        let found = records
            .into_iter()
            .find(|r| r.topic == topic && r.group == group && r.partition == partition);

        match found {
            Some(record) => Ok(PartitionOffsetFact {
                topic: record.topic,
                group: record.group,
                partition: record.partition,
                log_end_offset: 0,
                committed: (record.offset >= 0).then_some(record.offset),
                owner: record.owner,
                captured_at_ms: record.timestamp,
            }),
            None => Ok(PartitionOffsetFact::absent(topic, group, partition)),
        }
    }

    #[instrument(skip(self))]
    async fn group_topics(&self, cluster: &str) -> Result<GroupMembership> {
        let payload = self.collector.group_snapshot(cluster).await?;
        Self::parse_group_snapshot(&payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedCollector {
        offsets: String,
        groups: String,
    }

    #[async_trait]
    impl CollectorClient for FixedCollector {
        async fn offset_snapshot(&self, _cluster: &str) -> Result<String> {
            Ok(self.offsets.clone())
        }

        async fn group_snapshot(&self, _cluster: &str) -> Result<String> {
            Ok(self.groups.clone())
        }
    }

    fn source_with(offsets: &str, groups: &str) -> NativeOffsetSource {
        NativeOffsetSource::new(Arc::new(FixedCollector {
            offsets: offsets.to_string(),
            groups: groups.to_string(),
        }))
    }

    #[tokio::test]
    async fn test_filters_snapshot_for_requested_triple() {
        let offsets = r#"[
            {"topic": "t1", "group": "g1", "partition": 0, "offset": 900, "timestamp": 1700000000000, "owner": "g1_host-1"},
            {"topic": "t1", "group": "g1", "partition": 1, "offset": 450, "timestamp": 1700000000000, "owner": "g1_host-2"},
            {"topic": "t2", "group": "g1", "partition": 0, "offset": 10, "timestamp": 1700000000000, "owner": ""}
        ]"#;
        let source = source_with(offsets, "{}");

        let fact = source.committed_offset("c1", "t1", "g1", 1).await.unwrap();
        assert_eq!(fact.committed, Some(450));
        assert_eq!(fact.owner, "g1_host-2");
        assert_eq!(fact.captured_at_ms, 1_700_000_000_000);
    }

    #[tokio::test]
    async fn test_sentinel_offset_becomes_none() {
        let offsets = r#"[
            {"topic": "t1", "group": "g1", "partition": 0, "offset": -1, "owner": ""}
        ]"#;
        let source = source_with(offsets, "{}");

        let fact = source.committed_offset("c1", "t1", "g1", 0).await.unwrap();
        assert_eq!(fact.committed, None);
    }

    #[tokio::test]
    async fn test_unknown_triple_yields_absent_fact() {
        let source = source_with("[]", "{}");

        let fact = source.committed_offset("c1", "t1", "g1", 0).await.unwrap();
        assert_eq!(fact.committed, None);
        assert_eq!(fact.topic, "t1");
        assert_eq!(fact.group, "g1");
    }

    #[tokio::test]
    async fn test_malformed_offset_snapshot_is_source_unavailable() {
        let source = source_with("{not json", "{}");

        let err = source.committed_offset("c1", "t1", "g1", 0).await.unwrap_err();
        assert!(matches!(err, LagmonError::OffsetSourceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_group_snapshot_parses_membership() {
        let groups = r#"{"g1": ["t1", "t2"], "g2": ["t3"]}"#;
        let source = source_with("[]", groups);

        let membership = source.group_topics("c1").await.unwrap();
        assert_eq!(membership.len(), 2);
        assert_eq!(membership["g1"], vec!["t1", "t2"]);
        assert_eq!(membership["g2"], vec!["t3"]);
    }

    #[tokio::test]
    async fn test_malformed_group_snapshot_is_source_unavailable() {
        let source = source_with("[]", r#"["not", "a", "map"]"#);

        let err = source.group_topics("c1").await.unwrap_err();
        assert!(matches!(err, LagmonError::OffsetSourceUnavailable(_)));
    }
}
