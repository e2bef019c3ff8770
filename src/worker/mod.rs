pub mod sample;
pub mod worker;

pub use sample::PoolSample;
pub use worker::IngestWorker;
