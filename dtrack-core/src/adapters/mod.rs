//! Adapter implementations
//!
//! Concrete storage access lives here. The only adapter is the DuckDB
//! repository; services hold it behind an `Arc` and never touch SQL.

pub mod duckdb;
