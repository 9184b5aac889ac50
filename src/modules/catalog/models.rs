use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};

/// 规则分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Temp,
    Cache,
    Logs,
    Privacy,
    Browser,
    Update,
    Crash,
    Apps,
    System,
    Registry,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Temp => "temp",
            Category::Cache => "cache",
            Category::Logs => "logs",
            Category::Privacy => "privacy",
            Category::Browser => "browser",
            Category::Update => "update",
            Category::Crash => "crash",
            Category::Apps => "apps",
            Category::System => "system",
            Category::Registry => "registry",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// 风险等级，High 需要调用方额外确认
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Risk {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Risk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Risk::Low => "low",
            Risk::Medium => "medium",
            Risk::High => "high",
        };
        f.pad(name)
    }
}

/// 文件的删除方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalAction {
    #[default]
    Delete,
    /// 移入回收站
    Recycle,
}

/// 单文件过滤条件
#[derive(Debug, Clone, Default)]
pub struct FileFilter {
    /// 相对目标根目录的匹配模式（正斜杠）
    pub pattern: Option<glob::Pattern>,
    pub min_age: Option<Duration>,
    pub min_size: Option<u64>,
}

impl FileFilter {
    pub fn is_empty(&self) -> bool {
        self.pattern.is_none() && self.min_age.is_none() && self.min_size.is_none()
    }

    /// 单个文件是否命中过滤条件
    ///
    /// relative 为相对目标根目录的正斜杠路径；大小或修改时间未知时，
    /// 对应条件视为不满足。
    pub fn accepts(
        &self,
        relative: &str,
        len: Option<u64>,
        modified: Option<SystemTime>,
        now: SystemTime,
    ) -> bool {
        if let Some(pattern) = &self.pattern {
            let options = glob::MatchOptions {
                case_sensitive: false,
                require_literal_separator: false,
                require_literal_leading_dot: false,
            };
            if !pattern.matches_with(relative, options) {
                return false;
            }
        }

        if let Some(min_size) = self.min_size {
            match len {
                Some(len) if len >= min_size => {}
                _ => return false,
            }
        }

        if let Some(min_age) = self.min_age {
            let age = modified.and_then(|m| now.duration_since(m).ok());
            match age {
                Some(age) if age >= min_age => {}
                _ => return false,
            }
        }

        true
    }
}

/// 规则的解析策略（引擎内部使用，不对外序列化）
#[derive(Debug, Clone)]
pub enum Strategy {
    /// 固定路径，支持 %VAR% 与通配符
    Path {
        path: String,
        filter: FileFilter,
        purge_root: bool,
    },
    /// 每个固定磁盘上每个用户配置目录下的相对路径
    Profile { relative: String, filter: FileFilter },
    /// 每个固定磁盘根目录下的相对路径
    Drive { relative: String, filter: FileFilter },
    /// 外部工具
    Tool { program: String, args: Vec<String> },
    /// 孤立的卸载注册表项
    RegistryOrphans,
    /// 未关联卸载记录的旧程序目录
    AppResidue { min_age_days: Option<u64> },
}

impl Strategy {
    pub fn kind(&self) -> &'static str {
        match self {
            Strategy::Path { .. } => "path",
            Strategy::Profile { .. } => "profile",
            Strategy::Drive { .. } => "drive",
            Strategy::Tool { .. } => "tool",
            Strategy::RegistryOrphans => "registry_orphans",
            Strategy::AppResidue { .. } => "app_residue",
        }
    }
}

/// 规则目录条目，加载后只读
#[derive(Debug, Clone, Serialize)]
pub struct Rule {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub risk: Risk,
    pub default_checked: bool,
    pub requires_admin: bool,
    pub portable_guard: bool,
    pub action: RemovalAction,
    #[serde(skip)]
    pub retired: bool,
    #[serde(skip)]
    pub sort_order: i64,
    #[serde(skip)]
    pub strategy: Strategy,
}

/// 无法求值的规则（目录损坏），不会出现在列表中
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionFailure {
    pub rule_id: Option<String>,
    pub reason: String,
}

impl std::fmt::Display for ResolutionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}",
            self.rule_id.as_deref().unwrap_or("<unknown>"),
            self.reason
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    #[test]
    fn empty_filter_accepts_everything() {
        let filter = FileFilter::default();
        assert!(filter.is_empty());
        assert!(filter.accepts("a/b.tmp", None, None, SystemTime::now()));
    }

    #[test]
    fn pattern_age_and_size_must_all_hold() {
        let now = SystemTime::now();
        let filter = FileFilter {
            pattern: glob::Pattern::new("**/*.log").ok(),
            min_age: Some(2 * DAY),
            min_size: Some(10),
        };
        let old = now.checked_sub(3 * DAY);

        assert!(filter.accepts("Logs/CBS/cbs.LOG", Some(10), old, now));
        assert!(!filter.accepts("Logs/CBS/cbs.txt", Some(10), old, now));
        assert!(!filter.accepts("Logs/cbs.log", Some(9), old, now));
        assert!(!filter.accepts("Logs/cbs.log", Some(10), Some(now), now));
        assert!(!filter.accepts("Logs/cbs.log", None, old, now));
    }
}

// 以下为目录 JSON 的原始结构

#[derive(Debug, Deserialize)]
pub(crate) struct CatalogDocument {
    pub version: u32,
    pub rules: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RuleDefinition {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub risk: Risk,
    #[serde(default)]
    pub default_checked: bool,
    #[serde(default)]
    pub requires_admin: bool,
    #[serde(default)]
    pub portable_guard: bool,
    #[serde(default)]
    pub action: RemovalAction,
    #[serde(default)]
    pub retired: bool,
    #[serde(default)]
    pub sort_order: i64,
    pub strategy: StrategyDefinition,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(crate) enum StrategyDefinition {
    Path {
        path: String,
        pattern: Option<String>,
        min_age_days: Option<u64>,
        min_size_mb: Option<u64>,
        #[serde(default)]
        purge_root: bool,
    },
    Profile {
        relative: String,
        pattern: Option<String>,
        min_age_days: Option<u64>,
        min_size_mb: Option<u64>,
    },
    Drive {
        relative: String,
        pattern: Option<String>,
        min_age_days: Option<u64>,
        min_size_mb: Option<u64>,
    },
    Tool {
        program: String,
        #[serde(default)]
        args: Vec<String>,
    },
    RegistryOrphans,
    AppResidue {
        min_age_days: Option<u64>,
    },
}
