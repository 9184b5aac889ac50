use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::modules::catalog::models::{FileFilter, RemovalAction};

/// 目标位置
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TargetLocation {
    /// 文件或目录；purge_root 为真时目录本身也会被删除
    Path {
        path: PathBuf,
        purge_root: bool,
        action: RemovalAction,
    },
    /// 带根键前缀的注册表键 (HKLM\...)
    RegistryKey { key: String },
    /// 外部工具调用
    Tool { program: PathBuf, args: Vec<String> },
}

/// 单次求值得到的具体目标，不持久化
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    pub rule_id: String,
    /// 所在磁盘；注册表与工具目标没有磁盘
    pub drive: Option<String>,
    pub location: TargetLocation,
    pub filter: FileFilter,
}

impl ResolvedTarget {
    pub fn path(&self) -> Option<&Path> {
        match &self.location {
            TargetLocation::Path { path, .. } => Some(path),
            _ => None,
        }
    }

    pub fn describe(&self) -> String {
        match &self.location {
            TargetLocation::Path { path, .. } => path.to_string_lossy().to_string(),
            TargetLocation::RegistryKey { key } => key.clone(),
            TargetLocation::Tool { program, args } => {
                format!("{} {}", program.to_string_lossy(), args.join(" "))
            }
        }
    }
}
