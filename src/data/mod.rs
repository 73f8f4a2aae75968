//! Data layer: merge & derive, memoization, and filtering.
//!
//! ```text
//!  housing_prices.csv  median_income.csv  population.csv
//!          │                  │                 │
//!          └──── io::ingest ──┴─────────────────┘
//!                     │  three (year, value) tables
//!                     ▼
//!                  merge        inner join on year, index + YoY columns
//!                     │
//!                     ▼
//!                  cache        one Arc<MergedTable> per set of input files
//!                     │
//!                     ▼
//!                  filter       year range → row slice (per interaction)
//! ```

pub mod cache;
pub mod filter;
pub mod merge;

pub use cache::MergedCache;
pub use filter::{clamp_selection, default_range, default_selection, filter_rows};
pub use merge::merge;
