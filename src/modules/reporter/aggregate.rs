use std::collections::BTreeMap;

use super::models::{CleanSummary, SummaryBucket};
use crate::modules::cleaner::models::CleanItemResult;
use crate::modules::scanner::models::Usage;

/// 汇总清理结果
///
/// blocked、error、incomplete 项不计入总数和分组，但仍保留在报告条目中。
/// 百分比由未取整的总和计算，分组之间不做取整补偿。
pub fn aggregate(items: &[CleanItemResult]) -> CleanSummary {
    let mut total = Usage::default();
    let mut by_category: BTreeMap<String, Usage> = BTreeMap::new();
    let mut by_drive: BTreeMap<String, Usage> = BTreeMap::new();

    for item in items.iter().filter(|i| i.status.counts_toward_summary()) {
        let freed = Usage::new(item.total_bytes, item.total_files);
        total += freed;
        *by_category
            .entry(item.category.as_str().to_string())
            .or_default() += freed;

        for (drive, usage) in &item.freed_by_drive {
            *by_drive.entry(drive.clone()).or_default() += *usage;
        }
    }

    CleanSummary {
        total_bytes: total.bytes,
        total_files: total.files,
        by_category: into_buckets(by_category, total.bytes),
        by_drive: into_buckets(by_drive, total.bytes),
    }
}

fn into_buckets(groups: BTreeMap<String, Usage>, total_bytes: u64) -> Vec<SummaryBucket> {
    let mut buckets: Vec<SummaryBucket> = groups
        .into_iter()
        .map(|(key, usage)| SummaryBucket {
            key,
            bytes: usage.bytes,
            files: usage.files,
            percent: percent_of(usage.bytes, total_bytes),
        })
        .collect();

    // 按字节降序，相同时按 key 保证顺序稳定
    buckets.sort_by(|a, b| b.bytes.cmp(&a.bytes).then_with(|| a.key.cmp(&b.key)));
    buckets
}

fn percent_of(bytes: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = bytes as f64 * 100.0 / total as f64;
    (raw * 10.0).round() / 10.0
}
