// src/reporting/mod.rs
//! Result reporting
//!
//! Completed sessions are appended to one CSV file per test kind.

pub mod csv_log;

pub use csv_log::{ResultLogConfig, ResultLogger};
