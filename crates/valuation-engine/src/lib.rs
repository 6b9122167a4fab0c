//! Derived valuation metrics for the analysis grids.
//!
//! Two near-identical pipelines share one engine: earning analyses are
//! P/E-driven, revenue analyses P/S-driven. Each takes a fetched page of
//! records plus their growth histories and appends normalized growth,
//! ratio, fair-value, and upside columns. Everything here is pure and
//! synchronous; missing inputs propagate as `None` through every
//! downstream field.

pub mod pipeline;
pub mod series;
pub mod strategy;

pub use pipeline::*;
pub use series::*;
pub use strategy::*;
