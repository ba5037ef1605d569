//! Backup service - JSON export and full-replace import
//!
//! Import is not transactional: all rows are deleted first and the file's
//! rows are inserted one statement at a time. If an insert fails part-way
//! the database keeps whatever was inserted before the failure, and the
//! error is returned to the caller.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::adapters::duckdb::DuckDbRepository;
use crate::config::Config;
use crate::domain::result::{Error, Result};
use crate::domain::{BackupAppointment, BackupDocument, BackupFile, BackupProduct};

/// Backup service for dataset export and restore
pub struct BackupService {
    repository: Arc<DuckDbRepository>,
    /// Backup locations are resolved against this on every call
    config: Config,
}

impl BackupService {
    pub fn new(repository: Arc<DuckDbRepository>, config: &Config) -> Self {
        Self {
            repository,
            config: config.clone(),
        }
    }

    /// File [`write_backup`](Self::write_backup) would write right now
    pub fn export_target(&self) -> PathBuf {
        self.config.export_target()
    }

    /// File [`restore_backup`](Self::restore_backup) would read right now
    pub fn import_source(&self) -> PathBuf {
        self.config.import_source()
    }

    /// Snapshot every product and appointment in storage order
    pub fn export(&self) -> Result<BackupDocument> {
        let products = self.repository.get_products_in_storage_order()?;
        let appointments = self.repository.get_appointments_in_storage_order()?;

        Ok(BackupDocument {
            exported_at: Some(Utc::now().to_rfc3339()),
            products: products.iter().map(BackupProduct::from).collect(),
            appointments: appointments.iter().map(BackupAppointment::from).collect(),
        })
    }

    /// Replace the whole dataset with the document's contents
    ///
    /// Rows are inserted as found; ids are regenerated.
    pub fn import(&self, document: &BackupDocument) -> Result<ImportResult> {
        let (products_deleted, appointments_deleted) = self.repository.delete_all()?;

        for product in &document.products {
            self.repository.insert_backup_product(product)?;
        }
        for appointment in &document.appointments {
            self.repository.insert_backup_appointment(appointment)?;
        }

        let result = ImportResult {
            products_deleted,
            appointments_deleted,
            products: document.products.len(),
            appointments: document.appointments.len(),
        };
        info!(
            products = result.products,
            appointments = result.appointments,
            "backup imported"
        );
        Ok(result)
    }

    /// Parse backup JSON
    pub fn parse(json: &str) -> Result<BackupDocument> {
        serde_json::from_str(json).map_err(|e| Error::MalformedBackup(e.to_string()))
    }

    /// Export and write pretty-printed JSON, to `path` or the configured target
    pub fn write_backup(&self, path: Option<&Path>) -> Result<BackupFile> {
        let target = match path {
            Some(path) => path.to_path_buf(),
            None => self.export_target(),
        };
        let document = self.export()?;

        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&document)?;
        fs::write(&target, content)?;

        let size_bytes = fs::metadata(&target)?.len();
        info!(path = %target.display(), size_bytes, "backup written");

        Ok(BackupFile {
            path: target,
            created_at: Utc::now(),
            size_bytes,
            products: document.products.len(),
            appointments: document.appointments.len(),
        })
    }

    /// Read a backup file, from `path` or the configured source, and import it
    pub fn restore_backup(&self, path: Option<&Path>) -> Result<ImportResult> {
        let source = match path {
            Some(path) => path.to_path_buf(),
            None => self.import_source(),
        };
        if !source.exists() {
            return Err(Error::not_found(format!(
                "Backup file {}",
                source.display()
            )));
        }

        let content = fs::read_to_string(&source)?;
        let document = Self::parse(&content)?;
        self.import(&document)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportResult {
    pub products_deleted: usize,
    pub appointments_deleted: usize,
    pub products: usize,
    pub appointments: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_invalid_json() {
        let err = BackupService::parse("{ not json").unwrap_err();
        assert!(matches!(err, Error::MalformedBackup(_)));
    }

    #[test]
    fn test_parse_accepts_legacy_file() {
        let doc = BackupService::parse(
            r#"{
                "exported_at": "2024-06-01T18:22:03.123456",
                "products": [{"id": 3, "name": "Shampoo", "qty": 5, "unit_price": 8.5, "threshold": 1}],
                "appointments": [{"id": 9, "client": "Bianchi", "address": null,
                                  "datetime": "2024-06-02 09:00", "service": "Lavaggio", "price": 25}]
            }"#,
        )
        .unwrap();

        assert_eq!(doc.products.len(), 1);
        assert_eq!(doc.products[0].qty, Some(5.0));
        assert_eq!(doc.appointments[0].address, None);
        assert_eq!(doc.appointments[0].consumption, None);
    }
}
