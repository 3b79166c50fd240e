//! Core domain types and computation.

pub mod ohlcv;
pub mod price_matrix;
pub mod indicator;
pub mod indicator_helpers;
pub mod stats;
pub mod returns;
pub mod metrics;
pub mod correlation;
pub mod features;
pub mod diagnostic;
pub mod config_validation;
pub mod error;
