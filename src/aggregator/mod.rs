pub mod lag;

pub use lag::{partition_contribution, Contribution, LagAggregator};
