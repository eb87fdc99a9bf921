use crate::error::{LagmonError, Result};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub alerts: AlertsConfig,
    pub clusters: Vec<ClusterConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MonitorConfig {
    /// Where committed offsets live: inside the cluster (`native`, surfaced
    /// by the remote collector) or in the external coordination store.
    #[serde(default)]
    pub offset_storage: OffsetStorage,
    #[serde(with = "humantime_serde", default = "default_broker_cache_ttl")]
    pub broker_cache_ttl: Duration,
    #[serde(default = "default_max_concurrent_clusters")]
    pub max_concurrent_clusters: usize,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OffsetStorage {
    #[default]
    Native,
    External,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AlertsConfig {
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClusterConfig {
    pub alias: String,
    #[serde(default = "default_whitelist")]
    pub group_whitelist: Vec<String>,
    #[serde(default)]
    pub group_blacklist: Vec<String>,
    #[serde(default = "default_whitelist")]
    pub topic_whitelist: Vec<String>,
    #[serde(default = "default_topic_blacklist")]
    pub topic_blacklist: Vec<String>,
}

fn default_broker_cache_ttl() -> Duration {
    Duration::from_secs(30 * 60)
}

fn default_max_concurrent_clusters() -> usize {
    4
}

fn default_whitelist() -> Vec<String> {
    vec![".*".to_string()]
}

fn default_topic_blacklist() -> Vec<String> {
    vec!["__.*".to_string()]
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            offset_storage: OffsetStorage::default(),
            broker_cache_ttl: default_broker_cache_ttl(),
            max_concurrent_clusters: default_max_concurrent_clusters(),
        }
    }
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self { enabled: false }
    }
}

impl Config {
    pub fn load(path: Option<&str>) -> Result<Config> {
        let config_path = path.unwrap_or("lagmon.toml");

        if !Path::new(config_path).exists() {
            return Err(LagmonError::Config(format!(
                "Configuration file not found: {}",
                config_path
            )));
        }

        let content = std::fs::read_to_string(config_path)?;
        let content = Self::substitute_env_vars(&content);

        let config: Config = toml::from_str(&content)
            .map_err(|e| LagmonError::Config(format!("TOML parse error: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    fn substitute_env_vars(content: &str) -> String {
        // Supports:
        // - ${VAR} - replaced with env var value, empty string if not set
        // - ${VAR:-default} - replaced with env var value, or "default" if not set
        let re = Regex::new(r"\$\{([^}:-]+)(?::-([^}]*))?\}").unwrap();
        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            let default_value = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            std::env::var(var_name).unwrap_or_else(|_| default_value.to_string())
        })
        .to_string()
    }

    pub fn validate(&self) -> Result<()> {
        if self.clusters.is_empty() {
            return Err(LagmonError::Config(
                "At least one cluster must be configured".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for cluster in &self.clusters {
            cluster.validate()?;
            if !seen.insert(cluster.alias.as_str()) {
                return Err(LagmonError::Config(format!(
                    "Duplicate cluster alias: {}",
                    cluster.alias
                )));
            }
        }

        if self.monitor.max_concurrent_clusters == 0 {
            return Err(LagmonError::Config(
                "max_concurrent_clusters must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Aliases in configuration order, ready to hand to `run_cycle`.
    pub fn cluster_aliases(&self) -> Vec<String> {
        self.clusters.iter().map(|c| c.alias.clone()).collect()
    }

    pub fn cluster(&self, alias: &str) -> Option<&ClusterConfig> {
        self.clusters.iter().find(|c| c.alias == alias)
    }
}

impl ClusterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.alias.is_empty() {
            return Err(LagmonError::Config(
                "Cluster alias cannot be empty".to_string(),
            ));
        }

        self.compile_filters()?;
        Ok(())
    }

    pub fn compile_filters(&self) -> Result<CompiledFilters> {
        let group_whitelist = self
            .group_whitelist
            .iter()
            .map(|p| Regex::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let group_blacklist = self
            .group_blacklist
            .iter()
            .map(|p| Regex::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let topic_whitelist = self
            .topic_whitelist
            .iter()
            .map(|p| Regex::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let topic_blacklist = self
            .topic_blacklist
            .iter()
            .map(|p| Regex::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(CompiledFilters {
            group_whitelist,
            group_blacklist,
            topic_whitelist,
            topic_blacklist,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CompiledFilters {
    pub group_whitelist: Vec<Regex>,
    pub group_blacklist: Vec<Regex>,
    pub topic_whitelist: Vec<Regex>,
    pub topic_blacklist: Vec<Regex>,
}

impl CompiledFilters {
    /// Filters that pass every group and every topic.
    pub fn allow_all() -> Self {
        ClusterConfig {
            alias: "unused".to_string(),
            group_whitelist: default_whitelist(),
            group_blacklist: Vec::new(),
            topic_whitelist: default_whitelist(),
            topic_blacklist: Vec::new(),
        }
        .compile_filters()
        .expect("default filter patterns are valid")
    }

    pub fn matches_group(&self, group: &str) -> bool {
        let matches_whitelist = self.group_whitelist.iter().any(|r| r.is_match(group));
        let matches_blacklist = self.group_blacklist.iter().any(|r| r.is_match(group));
        matches_whitelist && !matches_blacklist
    }

    pub fn matches_topic(&self, topic: &str) -> bool {
        let matches_whitelist = self.topic_whitelist.iter().any(|r| r.is_match(topic));
        let matches_blacklist = self.topic_blacklist.iter().any(|r| r.is_match(topic));
        matches_whitelist && !matches_blacklist
    }
}
