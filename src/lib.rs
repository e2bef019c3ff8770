pub mod config;
pub mod db;
pub mod error;
pub mod stats;
pub mod utils;
pub mod worker;

pub use config::Settings;
pub use db::Database;
pub use error::StoreError;
pub use worker::{IngestWorker, PoolSample};
