//! Shared domain types and the immutable run registry.

pub mod config;
pub mod types;

pub use config::*;
pub use types::*;
