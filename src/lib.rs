//! `m2-history` library crate.
//!
//! The binary (`m2`) is a thin wrapper around this library so that:
//!
//! - the full reconciliation pipeline is testable without spawning processes
//! - modules are reusable (e.g., future chart front-ends or services)
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fx;
pub mod io;
pub mod math;
pub mod recon;
pub mod report;
