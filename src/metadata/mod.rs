pub mod cache;

pub use cache::BrokerMetadataCache;
