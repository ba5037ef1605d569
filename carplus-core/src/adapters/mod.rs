//! Adapter implementations
//!
//! DuckDB is the only storage backend; every SQL statement lives in
//! [`duckdb::DuckDbRepository`].

pub mod duckdb;
