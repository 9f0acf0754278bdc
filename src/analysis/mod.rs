//! Analysis modules.
//!
//! Grouping of fetched issues and report statistics.

pub mod aggregator;

pub use aggregator::*;
