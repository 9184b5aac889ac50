use std::collections::BTreeMap;

use serde::Serialize;

use crate::modules::blocker::BlockReason;
use crate::modules::catalog::models::{Category, Risk, Rule};
use crate::modules::reporter::models::CleanSummary;
use crate::modules::scanner::models::Usage;

/// 单个目标的删除结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Removal {
    /// 已实际删除的部分
    pub freed: Usage,
    pub failures: Vec<String>,
    /// 因取消而中途停止
    pub interrupted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalOutcome {
    Removed,
    PartiallyRemoved,
    Failed,
}

impl Removal {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            failures: vec![message.into()],
            ..Self::default()
        }
    }

    pub fn outcome(&self) -> RemovalOutcome {
        if self.failures.is_empty() {
            RemovalOutcome::Removed
        } else if self.freed.files > 0 || self.freed.bytes > 0 {
            RemovalOutcome::PartiallyRemoved
        } else {
            RemovalOutcome::Failed
        }
    }
}

/// 单条规则的清理状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CleanStatus {
    Ok,
    /// 部分目标失败
    Partial { message: String },
    Blocked { reason: BlockReason },
    /// 所有目标都删除失败
    Error { message: String },
    /// 清理被取消时尚未完成，已删除的内容不回滚
    Incomplete,
}

impl CleanStatus {
    pub fn name(&self) -> &'static str {
        match self {
            CleanStatus::Ok => "ok",
            CleanStatus::Partial { .. } => "partial",
            CleanStatus::Blocked { .. } => "blocked",
            CleanStatus::Error { .. } => "error",
            CleanStatus::Incomplete => "incomplete",
        }
    }

    /// 是否计入汇总
    pub fn counts_toward_summary(&self) -> bool {
        matches!(self, CleanStatus::Ok | CleanStatus::Partial { .. })
    }

    /// 阻止原因或首个失败信息
    pub fn message(&self) -> Option<String> {
        match self {
            CleanStatus::Partial { message } | CleanStatus::Error { message } => {
                Some(message.clone())
            }
            CleanStatus::Blocked { reason } => Some(reason.to_string()),
            CleanStatus::Ok | CleanStatus::Incomplete => None,
        }
    }
}

/// 清理报告中的单项
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanItemResult {
    pub id: String,
    pub title: String,
    pub category: Category,
    pub risk: Risk,
    #[serde(flatten)]
    pub status: CleanStatus,
    /// 实际释放的字节数
    pub total_bytes: u64,
    /// 实际删除的文件数
    pub total_files: u64,
    /// 按磁盘统计的释放量
    pub freed_by_drive: BTreeMap<String, Usage>,
}

impl CleanItemResult {
    pub fn new(rule: &Rule, status: CleanStatus) -> Self {
        Self {
            id: rule.id.clone(),
            title: rule.title.clone(),
            category: rule.category,
            risk: rule.risk,
            status,
            total_bytes: 0,
            total_files: 0,
            freed_by_drive: BTreeMap::new(),
        }
    }

    pub fn with_freed(mut self, freed: Usage, by_drive: BTreeMap<String, Usage>) -> Self {
        self.total_bytes = freed.bytes;
        self.total_files = freed.files;
        self.freed_by_drive = by_drive;
        self
    }
}

/// 清理报告
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanReport {
    /// 与请求顺序一致
    pub items: Vec<CleanItemResult>,
    pub summary: CleanSummary,
}
