pub mod enriched_pool;
pub mod median_snapshot;
pub mod observation;
pub mod pool_config;
pub mod rolling_stat;

pub use enriched_pool::EnrichedPool;
pub use median_snapshot::MedianSnapshot;
pub use observation::{NewObservation, Observation};
pub use pool_config::PoolConfig;
pub use rolling_stat::RollingStat;
