use serde::Serialize;
use std::ops::AddAssign;

use crate::modules::blocker::BlockReason;

/// 占用统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Usage {
    pub bytes: u64,
    pub files: u64,
}

impl Usage {
    pub fn new(bytes: u64, files: u64) -> Self {
        Self { bytes, files }
    }
}

impl AddAssign for Usage {
    fn add_assign(&mut self, other: Usage) {
        self.bytes += other.bytes;
        self.files += other.files;
    }
}

/// 单个目标统计失败（权限不足、路径消失等）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetFailure {
    pub target: String,
    pub message: String,
}

impl TargetFailure {
    pub fn new(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for TargetFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.target, self.message)
    }
}

/// 单条规则的扫描状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScanStatus {
    Ok,
    Blocked { reason: BlockReason },
    /// 所有目标都无法统计
    Error { message: String },
    /// 扫描被取消时尚未完成
    Incomplete,
}

/// 单条规则的扫描结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    pub id: String,
    #[serde(flatten)]
    pub status: ScanStatus,
    pub total_bytes: u64,
    /// 无法读取大小的文件也会计数
    pub total_files: u64,
}

impl ScanResult {
    pub fn blocked(id: &str, reason: BlockReason) -> Self {
        Self {
            id: id.to_string(),
            status: ScanStatus::Blocked { reason },
            total_bytes: 0,
            total_files: 0,
        }
    }

    pub fn incomplete(id: &str, usage: Usage) -> Self {
        Self {
            id: id.to_string(),
            status: ScanStatus::Incomplete,
            total_bytes: usage.bytes,
            total_files: usage.files,
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self.status, ScanStatus::Blocked { .. })
    }

    pub fn status_name(&self) -> &'static str {
        match self.status {
            ScanStatus::Ok => "ok",
            ScanStatus::Blocked { .. } => "blocked",
            ScanStatus::Error { .. } => "error",
            ScanStatus::Incomplete => "incomplete",
        }
    }
}
