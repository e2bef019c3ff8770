mod config;

pub use config::{IngestSettings, PostgresSettings, Settings};
