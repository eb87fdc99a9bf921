//! Consumer-group lag aggregation engine.
//!
//! For every (consumer group, topic, partition) triple across one or more
//! monitored clusters, `lagmon` computes how far the group has fallen behind
//! the produced data, rolls the per-partition numbers up into per-(group,
//! topic) minute-bucket aggregates, hands them to a persistence sink, and
//! raises threshold alerts.
//!
//! The crate is a library with a single produced operation:
//! [`LagMonitor::run_cycle`], meant to be driven by an external periodic
//! scheduler. Everything the engine talks to (cluster metadata, the offset
//! backends, the alarm store, the notification transport, the sink) is a
//! trait in [`remote`], so hosts wire in real clients and tests wire in
//! fakes. Committed offsets are read either from the cluster itself through
//! a remote collector (`native`) or from an external coordination store
//! (`external`); the variant is picked once from configuration.

pub mod aggregator;
pub mod alert;
pub mod config;
pub mod cycle;
pub mod domain;
pub mod error;
pub mod metadata;
pub mod remote;
pub mod source;

mod test_strategies;

pub use config::{Config, OffsetStorage};
pub use cycle::{Collaborators, CycleSummary, LagMonitor};
pub use domain::{
    AlarmRule, BrokerEndpoint, GroupMembership, PartitionOffsetFact, TopicGroupAggregate,
};
pub use error::{LagmonError, Result};
