use crate::aggregator::LagAggregator;
use crate::alert::AlertEvaluator;
use crate::config::{CompiledFilters, Config};
use crate::domain::current_minute_bucket;
use crate::error::{LagmonError, Result};
use crate::metadata::BrokerMetadataCache;
use crate::remote::{
    AggregateSink, AlarmStore, ClusterMetadata, CollectorClient, CoordinationStore, Notifier,
};
use crate::source::{self, OffsetSource};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::StreamExt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};

/// Everything the engine talks to but does not own. The offset-storage
/// collaborator matching the configured variant must be present; the other
/// may be omitted.
pub struct Collaborators {
    pub metadata: Arc<dyn ClusterMetadata>,
    pub collector: Option<Arc<dyn CollectorClient>>,
    pub coordination: Option<Arc<dyn CoordinationStore>>,
    pub alarms: Arc<dyn AlarmStore>,
    pub notifier: Arc<dyn Notifier>,
    pub sink: Arc<dyn AggregateSink>,
}

/// Outcome of one `run_cycle` invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleSummary {
    /// Clusters whose pipeline completed, including persist and alerting.
    pub processed: usize,
    /// Clusters whose pipeline failed and was isolated.
    pub failed: usize,
    /// Clusters skipped because a previous tick was still processing them.
    pub skipped: usize,
    pub aggregates: usize,
    pub alerts_fired: usize,
    pub elapsed: Duration,
}

enum ClusterOutcome {
    Processed { aggregates: usize, alerts: usize },
    Failed,
    Skipped,
}

/// The offset-lag aggregation engine. One instance is shared by every
/// scheduled tick; per-cycle state stays inside `run_cycle`, while the
/// broker cache, alert latch, and in-flight guard persist across ticks.
pub struct LagMonitor {
    config: Config,
    metadata: Arc<dyn ClusterMetadata>,
    broker_cache: BrokerMetadataCache,
    source: Arc<dyn OffsetSource>,
    sink: Arc<dyn AggregateSink>,
    evaluator: AlertEvaluator,
    in_flight: DashMap<String, ()>,
}

impl LagMonitor {
    pub fn new(config: Config, collaborators: Collaborators) -> Result<Self> {
        config.validate()?;

        let source = source::for_storage(
            config.monitor.offset_storage,
            collaborators.collector,
            collaborators.coordination,
        )?;
        let broker_cache = BrokerMetadataCache::new(
            Arc::clone(&collaborators.metadata),
            config.monitor.broker_cache_ttl,
        );
        let evaluator = AlertEvaluator::new(
            collaborators.alarms,
            collaborators.notifier,
            config.alerts.enabled,
        );

        info!(
            clusters = config.clusters.len(),
            offset_storage = ?config.monitor.offset_storage,
            alerts_enabled = config.alerts.enabled,
            broker_cache_ttl = ?config.monitor.broker_cache_ttl,
            "Created lag monitor"
        );

        Ok(Self {
            config,
            metadata: collaborators.metadata,
            broker_cache,
            source,
            sink: collaborators.sink,
            evaluator,
            in_flight: DashMap::new(),
        })
    }

    /// Run one collection cycle over the given cluster aliases. Each
    /// cluster's failure is isolated: it is logged and counted, never
    /// propagated to siblings. Aliases still being processed by an
    /// overlapping earlier tick are skipped.
    #[instrument(skip_all, fields(clusters = aliases.len()))]
    pub async fn run_cycle(&self, aliases: &[String]) -> CycleSummary {
        let start = Instant::now();
        let mut summary = CycleSummary::default();

        let outcomes: Vec<ClusterOutcome> = futures::stream::iter(aliases)
            .map(|alias| self.process_cluster(alias))
            .buffer_unordered(self.config.monitor.max_concurrent_clusters)
            .collect()
            .await;

        for outcome in outcomes {
            match outcome {
                ClusterOutcome::Processed { aggregates, alerts } => {
                    summary.processed += 1;
                    summary.aggregates += aggregates;
                    summary.alerts_fired += alerts;
                }
                ClusterOutcome::Failed => summary.failed += 1,
                ClusterOutcome::Skipped => summary.skipped += 1,
            }
        }

        summary.elapsed = start.elapsed();
        info!(
            processed = summary.processed,
            failed = summary.failed,
            skipped = summary.skipped,
            aggregates = summary.aggregates,
            alerts_fired = summary.alerts_fired,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "Collection cycle completed"
        );

        summary
    }

    async fn process_cluster(&self, alias: &str) -> ClusterOutcome {
        match self.in_flight.entry(alias.to_string()) {
            Entry::Occupied(_) => {
                warn!(
                    cluster = alias,
                    "Previous cycle still in flight, skipping this tick"
                );
                return ClusterOutcome::Skipped;
            }
            Entry::Vacant(entry) => {
                entry.insert(());
            }
        }

        let result = self.process_cluster_inner(alias).await;
        self.in_flight.remove(alias);

        match result {
            Ok((aggregates, alerts)) => ClusterOutcome::Processed { aggregates, alerts },
            Err(e) => {
                error!(cluster = alias, error = %e, "Cluster cycle failed");
                ClusterOutcome::Failed
            }
        }
    }

    #[instrument(skip_all, fields(cluster = alias))]
    async fn process_cluster_inner(&self, alias: &str) -> Result<(usize, usize)> {
        let start = Instant::now();
        let filters = self.cluster_filters(alias)?;

        let step = Instant::now();
        let brokers = self.broker_cache.brokers(alias).await?;
        let brokers_ms = step.elapsed().as_millis();

        let step = Instant::now();
        let membership = self.source.group_topics(alias).await?;
        let membership_ms = step.elapsed().as_millis();
        debug!(
            cluster = alias,
            groups = membership.len(),
            "Resolved group membership"
        );

        let bucket = current_minute_bucket();

        let step = Instant::now();
        let aggregates = LagAggregator::collect_cluster(
            alias,
            &brokers,
            &membership,
            &filters,
            self.metadata.as_ref(),
            self.source.as_ref(),
            &bucket,
        )
        .await?;
        let aggregate_ms = step.elapsed().as_millis();

        self.sink
            .insert(alias, &aggregates)
            .await
            .map_err(|e| match e {
                e @ LagmonError::PersistenceFailure(_) => e,
                other => LagmonError::PersistenceFailure(other.to_string()),
            })?;

        let alerts = self.evaluator.evaluate(alias, &aggregates).await?;

        info!(
            cluster = alias,
            brokers_ms = %brokers_ms,
            membership_ms = %membership_ms,
            aggregate_ms = %aggregate_ms,
            aggregates = aggregates.len(),
            alerts_fired = alerts,
            bucket = %bucket,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Cluster cycle step timings"
        );

        Ok((aggregates.len(), alerts))
    }

    fn cluster_filters(&self, alias: &str) -> Result<CompiledFilters> {
        match self.config.cluster(alias) {
            Some(cluster) => cluster.compile_filters(),
            None => Err(LagmonError::Config(format!(
                "Unknown cluster alias: {}",
                alias
            ))),
        }
    }

    /// Broker cache contents, for observability.
    pub fn broker_cache_entries(&self) -> usize {
        self.broker_cache.entry_count()
    }
}

impl std::fmt::Debug for LagMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LagMonitor")
            .field("clusters", &self.config.clusters.len())
            .field("offset_storage", &self.config.monitor.offset_storage)
            .finish_non_exhaustive()
    }
}
