use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Mapping from consumer group name to the topics it has committed offsets
/// for. Rebuilt fresh each cycle, never persisted. `BTreeMap` keeps the walk
/// order deterministic across cycles.
pub type GroupMembership = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BrokerEndpoint {
    pub host: String,
    pub port: u16,
}

impl BrokerEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for BrokerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// One committed-offset observation for a (topic, group, partition) triple.
///
/// `committed` is `None` when the group has no committed history for the
/// partition yet. Sources translate any wire-level sentinel at their
/// boundary; an absent offset can never leak into an aggregate sum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionOffsetFact {
    pub topic: String,
    pub group: String,
    pub partition: i32,
    pub log_end_offset: i64,
    pub committed: Option<i64>,
    pub owner: String,
    pub captured_at_ms: i64,
}

impl PartitionOffsetFact {
    /// A fact for a partition with no committed history.
    pub fn absent(topic: &str, group: &str, partition: i32) -> Self {
        Self {
            topic: topic.to_string(),
            group: group.to_string(),
            partition,
            log_end_offset: 0,
            committed: None,
            owner: String::new(),
            captured_at_ms: 0,
        }
    }
}

/// Per-(group, topic) roll-up for one collection cycle; the unit persisted
/// and alerted on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicGroupAggregate {
    pub cluster: String,
    pub group: String,
    pub topic: String,
    /// Minute-granularity bucket the cycle ran in, `YYYY-MM-DD HH:MM` (UTC).
    pub created_bucket: String,
    pub lag_sum: i64,
    pub log_size_sum: i64,
    pub offsets_sum: i64,
}

impl TopicGroupAggregate {
    pub fn new(cluster: &str, group: &str, topic: &str, created_bucket: &str) -> Self {
        Self {
            cluster: cluster.to_string(),
            group: group.to_string(),
            topic: topic.to_string(),
            created_bucket: created_bucket.to_string(),
            lag_sum: 0,
            log_size_sum: 0,
            offsets_sum: 0,
        }
    }
}

/// Threshold rule loaded fresh from the alarm configuration store every
/// cycle, so rule edits take effect on the next tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmRule {
    pub group: String,
    pub topic: String,
    pub lag_threshold: i64,
    pub owners: String,
}

/// Format a timestamp as its minute bucket.
pub fn minute_bucket(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}

/// The minute bucket the current cycle falls into.
pub fn current_minute_bucket() -> String {
    minute_bucket(Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_broker_endpoint_display() {
        let endpoint = BrokerEndpoint::new("kafka-1.example.com", 9092);
        assert_eq!(endpoint.to_string(), "kafka-1.example.com:9092");
    }

    #[test]
    fn test_minute_bucket_format() {
        let at = Utc.with_ymd_and_hms(2016, 8, 18, 9, 5, 42).unwrap();
        // Seconds are truncated, minute is zero-padded
        assert_eq!(minute_bucket(at), "2016-08-18 09:05");
    }

    #[test]
    fn test_absent_fact_has_no_committed_offset() {
        let fact = PartitionOffsetFact::absent("t1", "g1", 3);
        assert_eq!(fact.committed, None);
        assert_eq!(fact.partition, 3);
        assert!(fact.owner.is_empty());
    }

    #[test]
    fn test_aggregate_starts_at_identity() {
        let agg = TopicGroupAggregate::new("c1", "g1", "t1", "2016-08-18 09:05");
        assert_eq!(agg.lag_sum, 0);
        assert_eq!(agg.log_size_sum, 0);
        assert_eq!(agg.offsets_sum, 0);
    }
}
