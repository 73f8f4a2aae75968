//! `sb-trends` library crate.
//!
//! The binary (`trends`) is a thin wrapper around this library so that:
//!
//! - the merge/derive and shaping logic is testable without a terminal
//! - every front-end (TUI, text summary, CSV export) shares one pipeline

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod report;
pub mod tui;
