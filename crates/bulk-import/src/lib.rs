//! Bulk CSV ingestion and export for the analysis grids.
//!
//! The contract is deliberately narrow: typed rows in, success/error tally
//! out. Parsing and screening never touch storage: callers hand in an
//! [`ImportContext`] snapshot and persist the accepted rows themselves.

pub mod export;
pub mod rows;
pub mod screen;

pub use export::*;
pub use rows::*;
pub use screen::*;
