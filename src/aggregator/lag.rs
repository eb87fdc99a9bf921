use crate::config::CompiledFilters;
use crate::domain::{BrokerEndpoint, GroupMembership, TopicGroupAggregate};
use crate::error::Result;
use crate::remote::ClusterMetadata;
use crate::source::OffsetSource;
use tracing::{debug, instrument};

/// What one partition adds to its (group, topic) aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Contribution {
    pub lag: i64,
    pub log_size: i64,
    pub offsets: i64,
}

/// Per-partition lag arithmetic.
///
/// An empty partition (`log_end == 0`) is never behind, and a partition with
/// no committed history contributes nothing to lag or offsets. Otherwise lag
/// is `log_end - committed`, signed: a consumer sitting past the log end
/// after a retention truncation shows up negative rather than being hidden.
pub fn partition_contribution(log_end: i64, committed: Option<i64>) -> Contribution {
    let lag = match committed {
        _ if log_end == 0 => 0,
        None => 0,
        Some(committed) => log_end - committed,
    };

    Contribution {
        lag,
        log_size: log_end,
        offsets: committed.unwrap_or(0),
    }
}

/// Walks consumer groups → topics → partitions for one cluster and rolls
/// per-partition contributions up into minute-bucket aggregates.
pub struct LagAggregator;

impl LagAggregator {
    /// Build the aggregate list for one cluster and cycle. Any collaborator
    /// failure fails the whole cluster's cycle; the orchestrator decides
    /// what that means for sibling clusters.
    #[instrument(skip(brokers, membership, filters, metadata, source))]
    pub async fn collect_cluster(
        cluster: &str,
        brokers: &[BrokerEndpoint],
        membership: &GroupMembership,
        filters: &CompiledFilters,
        metadata: &dyn ClusterMetadata,
        source: &dyn OffsetSource,
        bucket: &str,
    ) -> Result<Vec<TopicGroupAggregate>> {
        let mut aggregates = Vec::new();

        for (group, topics) in membership {
            if !filters.matches_group(group) {
                debug!(cluster, group, "Group filtered out");
                continue;
            }

            for topic in topics {
                if !filters.matches_topic(topic) {
                    debug!(cluster, group, topic, "Topic filtered out");
                    continue;
                }

                let mut aggregate = TopicGroupAggregate::new(cluster, group, topic, bucket);

                for partition in metadata.list_partitions(cluster, topic).await? {
                    let log_end = metadata.log_end_offset(brokers, topic, partition).await?;
                    let fact = source
                        .committed_offset(cluster, topic, group, partition)
                        .await?;

                    let contribution = partition_contribution(log_end, fact.committed);
                    aggregate.lag_sum += contribution.lag;
                    aggregate.log_size_sum += contribution.log_size;
                    aggregate.offsets_sum += contribution.offsets;
                }

                debug!(
                    cluster,
                    group,
                    topic,
                    lag_sum = aggregate.lag_sum,
                    log_size_sum = aggregate.log_size_sum,
                    "Built topic-group aggregate"
                );
                aggregates.push(aggregate);
            }
        }

        Ok(aggregates)
    }
}
