//! Online statistics maintained per pool.
//!
//! - [`rolling`] - single-pass (Welford) mean/variance/product updates
//! - [`median`] - cross-pool median APY for snapshot rows

pub mod median;
pub mod rolling;

pub use median::median_apy;
