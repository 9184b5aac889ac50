use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::modules::cleaner::models::CleanReport;

/// 汇总分组（按分类或按磁盘）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryBucket {
    pub key: String,
    pub bytes: u64,
    pub files: u64,
    /// 占总释放量的百分比，保留一位小数
    pub percent: f64,
}

/// 清理汇总，只统计 ok 与 partial 的项
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CleanSummary {
    pub total_bytes: u64,
    pub total_files: u64,
    pub by_category: Vec<SummaryBucket>,
    pub by_drive: Vec<SummaryBucket>,
}

/// 可保存的清理报告
#[derive(Debug, Clone, Serialize)]
pub struct ReportDocument {
    pub id: String,
    pub generated_at: DateTime<Utc>,
    pub report: CleanReport,
}

impl ReportDocument {
    pub fn new(report: CleanReport) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            generated_at: Utc::now(),
            report,
        }
    }
}
