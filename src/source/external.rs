use crate::domain::{GroupMembership, PartitionOffsetFact};
use crate::error::Result;
use crate::remote::CoordinationStore;
use crate::source::OffsetSource;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::instrument;

/// Offset source for clusters whose committed offsets live in an external
/// coordination store. Lookups query the store for exactly the requested
/// triple; membership comes from listing the store's watch paths.
pub struct ExternalOffsetSource {
    store: Arc<dyn CoordinationStore>,
}

impl ExternalOffsetSource {
    pub fn new(store: Arc<dyn CoordinationStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl OffsetSource for ExternalOffsetSource {
    #[instrument(skip(self))]
    async fn committed_offset(
        &self,
        cluster: &str,
        topic: &str,
        group: &str,
        partition: i32,
    ) -> Result<PartitionOffsetFact> {
        let record = self
            .store
            .committed_offset(cluster, topic, group, partition)
            .await?;

        match record {
            Some(record) => Ok(PartitionOffsetFact {
                topic: topic.to_string(),
                group: group.to_string(),
                partition,
                log_end_offset: 0,
                committed: (record.offset >= 0).then_some(record.offset),
                owner: record.owner,
                captured_at_ms: record.committed_at_ms,
            }),
            None => Ok(PartitionOffsetFact::absent(topic, group, partition)),
        }
    }

    #[instrument(skip(self))]
    async fn group_topics(&self, cluster: &str) -> Result<GroupMembership> {
        self.store.list_groups(cluster).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::CommittedOffsetRecord;
    use std::collections::{BTreeMap, HashMap};

    struct MapStore {
        offsets: HashMap<(String, String, i32), CommittedOffsetRecord>,
        membership: GroupMembership,
    }

    #[async_trait]
    impl CoordinationStore for MapStore {
        async fn committed_offset(
            &self,
            _cluster: &str,
            topic: &str,
            group: &str,
            partition: i32,
        ) -> Result<Option<CommittedOffsetRecord>> {
            Ok(self
                .offsets
                .get(&(topic.to_string(), group.to_string(), partition))
                .cloned())
        }

        async fn list_groups(&self, _cluster: &str) -> Result<GroupMembership> {
            Ok(self.membership.clone())
        }
    }

    #[tokio::test]
    async fn test_store_record_becomes_fact() {
        let mut offsets = HashMap::new();
        offsets.insert(
            ("t1".to_string(), "g1".to_string(), 0),
            CommittedOffsetRecord {
                offset: 77,
                owner: "g1_host-3".to_string(),
                committed_at_ms: 42,
            },
        );
        let source = ExternalOffsetSource::new(Arc::new(MapStore {
            offsets,
            membership: BTreeMap::new(),
        }));

        let fact = source.committed_offset("c1", "t1", "g1", 0).await.unwrap();
        assert_eq!(fact.committed, Some(77));
        assert_eq!(fact.owner, "g1_host-3");
    }

    #[tokio::test]
    async fn test_missing_record_yields_absent_fact() {
        let source = ExternalOffsetSource::new(Arc::new(MapStore {
            offsets: HashMap::new(),
            membership: BTreeMap::new(),
        }));

        let fact = source.committed_offset("c1", "t1", "g1", 5).await.unwrap();
        assert_eq!(fact.committed, None);
        assert_eq!(fact.partition, 5);
    }

    #[tokio::test]
    async fn test_membership_from_watch_paths() {
        let mut membership = BTreeMap::new();
        membership.insert("g1".to_string(), vec!["t1".to_string()]);
        let source = ExternalOffsetSource::new(Arc::new(MapStore {
            offsets: HashMap::new(),
            membership,
        }));

        let groups = source.group_topics("c1").await.unwrap();
        assert_eq!(groups["g1"], vec!["t1"]);
    }
}
