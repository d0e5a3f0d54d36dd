//! Shared building blocks for EvalBoard services
//!
//! Provides the record store gateway (hosted REST backend plus an
//! in-memory double for tests), row normalization into domain records,
//! the evaluation probe plan, and configuration resolution.

pub mod config;
pub mod error;
pub mod probe;
pub mod records;
pub mod store;

pub use error::{Error, Result};
