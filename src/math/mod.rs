//! Numeric utilities over annual series: gap filling, medians, averaging.

pub mod series;

pub use series::*;
