//! Database access layer.
//!
//! This module provides:
//! - Connection pool management per backend
//! - The named registry of database handles
//! - Statement execution
//! - Type mappings for result decoding

pub mod executor;
pub mod pool;
pub mod registry;
pub mod types;

pub use executor::SqlExecutor;
pub use pool::DbPool;
pub use registry::{DbHandle, Registry};
