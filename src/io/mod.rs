//! Input/output helpers.
//!
//! - CSV ingest + normalization of the three sources (`ingest`)
//! - merged-table CSV export (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
