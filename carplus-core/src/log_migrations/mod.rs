//! Log database migrations - embedded SQL files
//!
//! Applied in order and recorded in `sys_migrations`, which the first
//! script creates.

/// Creates the table that tracks the others
pub const BOOTSTRAP_MIGRATION: &str = "000_migrations.sql";

/// Format: (filename, sql_content)
pub const LOG_MIGRATIONS: &[(&str, &str)] = &[
    (BOOTSTRAP_MIGRATION, include_str!("000_migrations.sql")),
    (
        "001_initial_schema.sql",
        include_str!("001_initial_schema.sql"),
    ),
];
