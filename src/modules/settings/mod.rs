//! 设置存储
//!
//! 字符串键值对，跨进程重启保留。每次调用独立打开连接。

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};

use crate::modules::common::error::SweepError;

const SCHEMA_SQL: &str = "
    CREATE TABLE IF NOT EXISTS settings (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
";

#[derive(Debug, Clone)]
pub struct SettingsStore {
    db_path: PathBuf,
}

impl SettingsStore {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn open(&self) -> Result<Connection, SweepError> {
        if let Some(parent) = self.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&self.db_path)?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(conn)
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, SweepError> {
        let conn = self.open()?;
        let value = conn
            .query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    pub fn set(&self, key: &str, value: &str) -> Result<(), SweepError> {
        if key.trim().is_empty() {
            return Err(SweepError::Settings("设置键不能为空".to_string()));
        }
        let conn = self.open()?;
        conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        tracing::debug!("设置已保存: {}", key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (SettingsStore, PathBuf) {
        let dir = std::env::temp_dir().join(format!("winsweep-settings-{}", uuid::Uuid::new_v4()));
        (SettingsStore::new(dir.join("nested").join("settings.db")), dir)
    }

    #[test]
    fn missing_key_is_absent() {
        let (store, dir) = temp_store();
        assert_eq!(store.get("show_sizes").expect("get"), None);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn set_overwrites_and_survives_reopen() {
        let (store, dir) = temp_store();
        store.set("show_sizes", "1").expect("set");
        store.set("show_sizes", "0").expect("set");

        let reopened = SettingsStore::new(store.path());
        assert_eq!(reopened.get("show_sizes").expect("get").as_deref(), Some("0"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn empty_key_is_rejected() {
        let (store, dir) = temp_store();
        assert!(matches!(store.set(" ", "x"), Err(SweepError::Settings(_))));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
