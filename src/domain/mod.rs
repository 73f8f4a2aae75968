//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - metric and scale enums (`Metric`, `ValueScale`)
//! - normalized source tables (`SeriesTable`) and the merged table (`MergedTable`)
//! - derived cells with explicit undefined markers (`Derived`)
//! - dashboard control state and long-form chart points (`Selection`, `ViewPoint`)

pub mod types;

pub use types::*;
