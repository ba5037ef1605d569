//! Configuration management
//!
//! Paths are resolved once and handed to the services; nothing reads
//! globals. An optional `settings.json` in the data directory can move the
//! backup file:
//! ```json
//! {
//!   "backup": { "externalPath": "/sdcard/CarPlus_backup.json", "fallbackPath": "..." },
//!   "dashboard": { "upcomingLimit": 5 }
//! }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DB_FILENAME: &str = "carplus.duckdb";
pub const LOG_DB_FILENAME: &str = "logs.duckdb";
pub const BACKUP_FILENAME: &str = "CarPlus_backup.json";
pub const SETTINGS_FILENAME: &str = "settings.json";

/// How many upcoming appointments the dashboard shows by default
pub const DEFAULT_UPCOMING_LIMIT: usize = 5;

/// Environment variable overriding the external backup path
pub const BACKUP_PATH_ENV: &str = "CARPLUS_BACKUP_PATH";

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "CARPLUS_DIR";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    backup: BackupSettings,
    #[serde(default)]
    dashboard: DashboardSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BackupSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    external_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fallback_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DashboardSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    upcoming_limit: Option<usize>,
}

/// CarPlus configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub log_db_path: PathBuf,
    /// Preferred backup location (removable storage, documents folder)
    pub external_backup_path: Option<PathBuf>,
    /// Used when the external location is unavailable
    pub fallback_backup_path: PathBuf,
    pub upcoming_limit: usize,
    // Keep the raw settings for preservation when saving
    _raw_settings: SettingsFile,
    // Backup paths as resolved by load, including env and platform defaults
    resolved_external: Option<PathBuf>,
    resolved_fallback: PathBuf,
}

impl Config {
    /// Default data directory: `$CARPLUS_DIR`, else `~/.carplus`
    pub fn default_data_dir() -> Option<PathBuf> {
        match std::env::var(DATA_DIR_ENV) {
            Ok(dir) if !dir.trim().is_empty() => Some(PathBuf::from(dir)),
            _ => dirs::home_dir().map(|home| home.join(".carplus")),
        }
    }

    /// Load config for a data directory
    ///
    /// The external backup path can be overridden with `CARPLUS_BACKUP_PATH`.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let env_override = std::env::var(BACKUP_PATH_ENV)
            .ok()
            .filter(|p| !p.trim().is_empty());
        Self::load_with_override(data_dir, env_override)
    }

    fn load_with_override(data_dir: &Path, backup_override: Option<String>) -> Result<Self> {
        let settings_path = data_dir.join(SETTINGS_FILENAME);

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)
                .with_context(|| format!("Failed to read {}", settings_path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Invalid settings file {}", settings_path.display()))?
        } else {
            SettingsFile::default()
        };

        let external_backup_path = backup_override
            .map(PathBuf::from)
            .or_else(|| raw.backup.external_path.clone())
            .or_else(|| dirs::document_dir().map(|d| d.join(BACKUP_FILENAME)));

        let fallback_backup_path = raw
            .backup
            .fallback_path
            .clone()
            .unwrap_or_else(|| data_dir.join(BACKUP_FILENAME));

        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            db_path: data_dir.join(DB_FILENAME),
            log_db_path: data_dir.join(LOG_DB_FILENAME),
            resolved_external: external_backup_path.clone(),
            resolved_fallback: fallback_backup_path.clone(),
            external_backup_path,
            fallback_backup_path,
            upcoming_limit: raw.dashboard.upcoming_limit.unwrap_or(DEFAULT_UPCOMING_LIMIT),
            _raw_settings: raw,
        })
    }

    /// Save config to the data directory
    /// Preserves other settings that CarPlus doesn't manage
    ///
    /// Backup paths are written only when changed since load, so an env
    /// override or platform default never lands in settings.json.
    pub fn save(&self) -> Result<()> {
        let settings_path = self.data_dir.join(SETTINGS_FILENAME);

        let mut settings = self._raw_settings.clone();
        if self.external_backup_path != self.resolved_external {
            settings.backup.external_path = self.external_backup_path.clone();
        }
        if self.fallback_backup_path != self.resolved_fallback {
            settings.backup.fallback_path = Some(self.fallback_backup_path.clone());
        }
        settings.dashboard.upcoming_limit = Some(self.upcoming_limit);

        std::fs::create_dir_all(&self.data_dir)?;
        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)?;
        Ok(())
    }

    /// Where a new backup is written: the external path when its folder
    /// exists, otherwise the fallback
    pub fn export_target(&self) -> PathBuf {
        match &self.external_backup_path {
            Some(path) if path.parent().is_some_and(Path::is_dir) => path.clone(),
            _ => self.fallback_backup_path.clone(),
        }
    }

    /// Where a backup is read from: the external file when it exists,
    /// otherwise the fallback
    pub fn import_source(&self) -> PathBuf {
        match &self.external_backup_path {
            Some(path) if path.is_file() => path.clone(),
            _ => self.fallback_backup_path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_without_settings_file() {
        let dir = tempdir().unwrap();
        let config = Config::load_with_override(dir.path(), None).unwrap();

        assert_eq!(config.db_path, dir.path().join(DB_FILENAME));
        assert_eq!(config.fallback_backup_path, dir.path().join(BACKUP_FILENAME));
        assert_eq!(config.upcoming_limit, DEFAULT_UPCOMING_LIMIT);
    }

    #[test]
    fn test_export_target_falls_back_when_external_dir_missing() {
        let dir = tempdir().unwrap();
        let mut config = Config::load_with_override(dir.path(), None).unwrap();

        config.external_backup_path = Some(dir.path().join("missing").join(BACKUP_FILENAME));
        assert_eq!(config.export_target(), config.fallback_backup_path);

        let external_dir = dir.path().join("sdcard");
        std::fs::create_dir_all(&external_dir).unwrap();
        config.external_backup_path = Some(external_dir.join(BACKUP_FILENAME));
        assert_eq!(config.export_target(), external_dir.join(BACKUP_FILENAME));
    }

    #[test]
    fn test_import_source_prefers_existing_external_file() {
        let dir = tempdir().unwrap();
        let external = dir.path().join("external.json");
        let config =
            Config::load_with_override(dir.path(), Some(external.display().to_string())).unwrap();

        assert_eq!(config.import_source(), config.fallback_backup_path);

        std::fs::write(&external, "{}").unwrap();
        assert_eq!(config.import_source(), external);
    }

    #[test]
    fn test_save_does_not_persist_backup_override() {
        let dir = tempdir().unwrap();
        let mut config =
            Config::load_with_override(dir.path(), Some("/tmp/usb/backup.json".to_string()))
                .unwrap();

        config.upcoming_limit = 3;
        config.save().unwrap();

        let saved = std::fs::read_to_string(dir.path().join(SETTINGS_FILENAME)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&saved).unwrap();
        assert!(value["backup"].get("externalPath").is_none());
        assert!(value["backup"].get("fallbackPath").is_none());
        assert_eq!(value["dashboard"]["upcomingLimit"], 3);

        let chosen = dir.path().join("sdcard").join(BACKUP_FILENAME);
        config.external_backup_path = Some(chosen.clone());
        config.save().unwrap();

        let reloaded = Config::load_with_override(dir.path(), None).unwrap();
        assert_eq!(reloaded.external_backup_path, Some(chosen));
    }

    #[test]
    fn test_save_preserves_unknown_settings() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILENAME),
            r#"{"theme": "violet", "dashboard": {"upcomingLimit": 3}}"#,
        )
        .unwrap();

        let mut config = Config::load_with_override(dir.path(), None).unwrap();
        assert_eq!(config.upcoming_limit, 3);

        config.upcoming_limit = 8;
        config.save().unwrap();

        let saved = std::fs::read_to_string(dir.path().join(SETTINGS_FILENAME)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&saved).unwrap();
        assert_eq!(value["theme"], "violet");
        assert_eq!(value["dashboard"]["upcomingLimit"], 8);
    }
}
