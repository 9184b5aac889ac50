//! 引擎配置
//!
//! 加载顺序: 默认值 -> 数据目录下的 config.json -> 环境变量

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::error::SweepError;

pub const DATA_DIR_ENV: &str = "WINSWEEP_DATA_DIR";
pub const WORKERS_ENV: &str = "WINSWEEP_WORKERS";
pub const CONFIG_FILE: &str = "config.json";

/// 卸载残留默认的最小闲置天数
pub const DEFAULT_RESIDUE_AGE_DAYS: u64 = 180;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// 规则级并发上限
    pub workers: usize,
    /// 数据目录 (设置数据库、报告)
    pub data_dir: PathBuf,
    pub residue_age_days: u64,
    /// 替换内置规则目录的 JSON 文件
    pub catalog_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            data_dir: default_data_dir(),
            residue_age_days: DEFAULT_RESIDUE_AGE_DAYS,
            catalog_path: None,
        }
    }
}

impl EngineConfig {
    /// 加载配置
    pub fn load() -> Result<Self, SweepError> {
        let data_dir = std::env::var(DATA_DIR_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        let mut config = Self::from_file(&data_dir.join(CONFIG_FILE))?.unwrap_or_default();

        // 环境变量覆盖文件配置
        config.data_dir = data_dir;
        if let Ok(raw) = std::env::var(WORKERS_ENV) {
            config.workers = raw
                .trim()
                .parse::<usize>()
                .map_err(|e| SweepError::Config(format!("{} 无效 ({}): {}", WORKERS_ENV, raw, e)))?;
        }

        config.workers = config.workers.max(1);
        tracing::debug!("引擎配置: {:?}", config);
        Ok(config)
    }

    /// 从 JSON 文件读取配置，文件不存在时返回 None
    pub fn from_file(path: &Path) -> Result<Option<Self>, SweepError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&content)
            .map_err(|e| SweepError::Config(format!("{}: {}", path.display(), e)))?;
        Ok(Some(config))
    }

    pub fn settings_db_path(&self) -> PathBuf {
        self.data_dir.join("settings.db")
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.data_dir.join("reports")
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("winsweep")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_file_yields_none() {
        let path = std::env::temp_dir()
            .join(format!("winsweep-config-{}", uuid::Uuid::new_v4()))
            .join(CONFIG_FILE);
        assert!(matches!(EngineConfig::from_file(&path), Ok(None)));
    }

    #[test]
    fn partial_config_file_keeps_defaults() {
        let root = std::env::temp_dir().join(format!("winsweep-config-{}", uuid::Uuid::new_v4()));
        assert!(std::fs::create_dir_all(&root).is_ok());
        let path = root.join(CONFIG_FILE);
        assert!(std::fs::write(&path, r#"{ "residue_age_days": 30 }"#).is_ok());

        let config = EngineConfig::from_file(&path).ok().flatten();
        let config = config.unwrap_or_default();
        assert_eq!(config.residue_age_days, 30);
        assert!(config.workers >= 1);
        assert!(config.catalog_path.is_none());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn malformed_config_file_is_reported() {
        let root = std::env::temp_dir().join(format!("winsweep-config-{}", uuid::Uuid::new_v4()));
        assert!(std::fs::create_dir_all(&root).is_ok());
        let path = root.join(CONFIG_FILE);
        assert!(std::fs::write(&path, "{ not json").is_ok());

        assert!(matches!(
            EngineConfig::from_file(&path),
            Err(SweepError::Config(_))
        ));

        let _ = std::fs::remove_dir_all(&root);
    }
}
