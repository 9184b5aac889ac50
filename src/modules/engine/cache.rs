use std::collections::HashMap;

use crate::modules::cleaner::models::CleanReport;
use crate::modules::scanner::models::{ScanResult, ScanStatus};

/// 最近一次扫描结果，由调用方持有
#[derive(Debug, Clone, Default)]
pub struct ScanCache {
    results: HashMap<String, ScanResult>,
}

impl ScanCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一轮扫描结果，未完成的项不覆盖已有记录
    pub fn record(&mut self, results: &[ScanResult]) {
        for result in results {
            if result.status == ScanStatus::Incomplete {
                continue;
            }
            self.results.insert(result.id.clone(), result.clone());
        }
    }

    pub fn get(&self, id: &str) -> Option<&ScanResult> {
        self.results.get(id)
    }

    /// 最近一次已知的可回收字节数
    pub fn last_known_bytes(&self, id: &str) -> Option<u64> {
        self.get(id).map(|r| r.total_bytes)
    }

    /// 清理后的规则需要重新扫描
    pub fn invalidate(&mut self, report: &CleanReport) {
        for item in &report.items {
            self.results.remove(&item.id);
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
