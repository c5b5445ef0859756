//! Reading/writing the dataset document and the run summary.

pub mod export;

pub use export::*;
