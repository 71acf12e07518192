//! Database abstraction layer.
//!
//! This module provides database access functionality:
//! - Connection pool management
//! - Statement execution
//! - Row decoding
//! - The permission-gated gateway the tools call into

pub mod executor;
pub mod gateway;
pub mod pool;
pub mod types;

pub use executor::QueryExecutor;
pub use gateway::DatabaseGateway;
pub use pool::{ConnectionManager, DbPool};
pub use types::{RowToCells, TypeCategory};
