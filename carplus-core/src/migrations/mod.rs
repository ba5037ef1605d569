//! Database schema - embedded SQL files and additive column upgrades
//!
//! Table scripts are compiled into the binary at build time using include_str!.
//! Every script uses IF NOT EXISTS so it can run on each startup.
//!
//! Older installs may have tables that predate some columns. Those columns
//! are listed in [`COLUMN_UPGRADES`] and added when missing.

/// Table creation scripts, applied in order.
/// Format: (filename, sql_content)
pub const TABLE_SCRIPTS: &[(&str, &str)] = &[
    ("001_products.sql", include_str!("001_products.sql")),
    ("002_appointments.sql", include_str!("002_appointments.sql")),
];

/// A column that may be missing from a table created by an older release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnUpgrade {
    pub table: &'static str,
    pub column: &'static str,
    pub sql_type: &'static str,
    /// SQL literal used as the column default
    pub default: &'static str,
}

impl ColumnUpgrade {
    pub fn alter_sql(&self) -> String {
        format!(
            "ALTER TABLE {} ADD COLUMN {} {} DEFAULT {}",
            self.table, self.column, self.sql_type, self.default
        )
    }
}

/// Columns added after the first release, applied independently of each other.
///
/// IMPORTANT: only append to this list. Columns are never dropped or renamed.
pub const COLUMN_UPGRADES: &[ColumnUpgrade] = &[
    ColumnUpgrade {
        table: "products",
        column: "unit_price",
        sql_type: "DOUBLE",
        default: "0",
    },
    ColumnUpgrade {
        table: "products",
        column: "threshold",
        sql_type: "DOUBLE",
        default: "0",
    },
    ColumnUpgrade {
        table: "appointments",
        column: "price",
        sql_type: "DOUBLE",
        default: "0",
    },
    ColumnUpgrade {
        table: "appointments",
        column: "consumption",
        sql_type: "VARCHAR",
        default: "''",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alter_sql() {
        assert_eq!(
            COLUMN_UPGRADES[3].alter_sql(),
            "ALTER TABLE appointments ADD COLUMN consumption VARCHAR DEFAULT ''"
        );
    }
}
