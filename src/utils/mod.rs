//! Utility functions for the yield store.
//!
//! - [`validation`] - observation admission checks and sanity bounds

mod validation;

pub use validation::{validate_observation, MAX_APY_PCT, MAX_TVL_USD};
