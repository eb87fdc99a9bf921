use crate::domain::TopicGroupAggregate;
use crate::error::Result;
use crate::remote::{AlarmStore, Notifier};
use dashmap::DashSet;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

const ALERT_SUBJECT: &str = "Consumer Lag Alert";

/// Compares cycle aggregates against alarm rules and dispatches
/// notifications for breaches.
///
/// Rules are re-read from the alarm store every evaluation, so edits take
/// effect on the next tick. A per-(cluster, group, topic, threshold) latch
/// suppresses repeat notifications for a sustained breach until a cycle
/// observes lag at or below the threshold, which rearms it. A failed dispatch
/// does not latch, so the next breaching cycle retries it.
pub struct AlertEvaluator {
    alarms: Arc<dyn AlarmStore>,
    notifier: Arc<dyn Notifier>,
    enabled: bool,
    latched: DashSet<(String, String, String, i64)>,
}

impl AlertEvaluator {
    pub fn new(alarms: Arc<dyn AlarmStore>, notifier: Arc<dyn Notifier>, enabled: bool) -> Self {
        Self {
            alarms,
            notifier,
            enabled,
            latched: DashSet::new(),
        }
    }

    /// Evaluate one cluster's aggregates. Returns the number of
    /// notifications dispatched. Per-rule dispatch failures are logged and
    /// never abort evaluation of the remaining rules; a failure to load the
    /// rules themselves fails the cluster's cycle.
    #[instrument(skip(self, aggregates), fields(aggregates = aggregates.len()))]
    pub async fn evaluate(&self, cluster: &str, aggregates: &[TopicGroupAggregate]) -> Result<usize> {
        if !self.enabled {
            return Ok(0);
        }

        let rules = self.alarms.alarm_rules(cluster).await?;
        debug!(cluster, rules = rules.len(), "Loaded alarm rules");

        let mut fired = 0;
        for rule in &rules {
            for aggregate in aggregates {
                if aggregate.group != rule.group || aggregate.topic != rule.topic {
                    continue;
                }

                let key = (
                    cluster.to_string(),
                    rule.group.clone(),
                    rule.topic.clone(),
                    rule.lag_threshold,
                );

                if aggregate.lag_sum > rule.lag_threshold {
                    if self.latched.contains(&key) {
                        debug!(
                            cluster,
                            group = rule.group,
                            topic = rule.topic,
                            lag = aggregate.lag_sum,
                            "Breach still latched, suppressing repeat notification"
                        );
                        continue;
                    }

                    let body = format!(
                        "Lag exceeds the configured threshold. Topic is [{}], current lag is [{}], threshold is [{}].",
                        rule.topic, aggregate.lag_sum, rule.lag_threshold
                    );

                    match self.notifier.send(&rule.owners, ALERT_SUBJECT, &body).await {
                        Ok(()) => {
                            self.latched.insert(key);
                            fired += 1;
                            info!(
                                cluster,
                                group = rule.group,
                                topic = rule.topic,
                                lag = aggregate.lag_sum,
                                threshold = rule.lag_threshold,
                                owners = rule.owners,
                                "Dispatched lag alert"
                            );
                        }
                        Err(e) => {
                            error!(
                                cluster,
                                group = rule.group,
                                topic = rule.topic,
                                error = %e,
                                "Failed to dispatch lag alert"
                            );
                        }
                    }
                } else if self.latched.remove(&key).is_some() {
                    info!(
                        cluster,
                        group = rule.group,
                        topic = rule.topic,
                        lag = aggregate.lag_sum,
                        "Lag back at or below threshold, alert rearmed"
                    );
                }
            }
        }

        Ok(fired)
    }
}

impl std::fmt::Debug for AlertEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertEvaluator")
            .field("enabled", &self.enabled)
            .field("latched", &self.latched.len())
            .finish()
    }
}
