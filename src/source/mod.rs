//! Dual offset-source abstraction.
//!
//! Committed offsets live either inside the monitored cluster (surfaced by a
//! remote collector) or in an external coordination store. Both backends
//! expose the same two operations; the variant is chosen once from
//! configuration, not re-evaluated per call.

pub mod external;
pub mod native;

use crate::config::OffsetStorage;
use crate::domain::{GroupMembership, PartitionOffsetFact};
use crate::error::{LagmonError, Result};
use crate::remote::{CollectorClient, CoordinationStore};
use async_trait::async_trait;
use std::sync::Arc;

pub use external::ExternalOffsetSource;
pub use native::NativeOffsetSource;

/// Uniform accessor for committed-offset facts and group membership,
/// regardless of where offsets are stored.
#[async_trait]
pub trait OffsetSource: Send + Sync {
    /// The committed-offset fact for one (topic, group, partition) triple.
    /// A triple with no committed history yields a fact with
    /// `committed: None`, never an error.
    async fn committed_offset(
        &self,
        cluster: &str,
        topic: &str,
        group: &str,
        partition: i32,
    ) -> Result<PartitionOffsetFact>;

    /// Group → topics membership for a cluster.
    async fn group_topics(&self, cluster: &str) -> Result<GroupMembership>;
}

/// Build the offset source matching the configured storage variant. The
/// unused collaborator may be omitted; selecting a variant whose
/// collaborator is missing is a configuration error.
pub fn for_storage(
    storage: OffsetStorage,
    collector: Option<Arc<dyn CollectorClient>>,
    store: Option<Arc<dyn CoordinationStore>>,
) -> Result<Arc<dyn OffsetSource>> {
    match storage {
        OffsetStorage::Native => {
            let collector = collector.ok_or_else(|| {
                LagmonError::Config(
                    "offset_storage = \"native\" requires a collector client".to_string(),
                )
            })?;
            Ok(Arc::new(NativeOffsetSource::new(collector)))
        }
        OffsetStorage::External => {
            let store = store.ok_or_else(|| {
                LagmonError::Config(
                    "offset_storage = \"external\" requires a coordination store".to_string(),
                )
            })?;
            Ok(Arc::new(ExternalOffsetSource::new(store)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_rejects_missing_collaborator() {
        let err = for_storage(OffsetStorage::Native, None, None).err().unwrap();
        assert!(matches!(err, LagmonError::Config(_)));

        let err = for_storage(OffsetStorage::External, None, None).err().unwrap();
        assert!(matches!(err, LagmonError::Config(_)));
    }
}
