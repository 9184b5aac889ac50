use std::fs;
use std::path::Path;
use std::time::SystemTime;

use tokio_util::sync::CancellationToken;
use walkdir::WalkDir;

use super::models::{TargetFailure, Usage};
use crate::modules::catalog::models::FileFilter;
use crate::modules::common::utils;

/// 统计路径占用
///
/// 文件直接取大小；目录递归累加，不跟随符号链接，无法读取的子项跳过。
/// 目标根目录本身无法访问时返回失败。
pub fn measure_path(
    path: &Path,
    filter: &FileFilter,
    cancel: &CancellationToken,
) -> Result<Usage, TargetFailure> {
    let shown = path.to_string_lossy().to_string();
    let metadata =
        fs::symlink_metadata(path).map_err(|e| TargetFailure::new(&shown, e.to_string()))?;
    let now = SystemTime::now();

    if !metadata.is_dir() {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if filter.accepts(&name, Some(metadata.len()), metadata.modified().ok(), now) {
            return Ok(Usage::new(metadata.len(), 1));
        }
        return Ok(Usage::default());
    }

    // 根目录不可读算作目标失败
    fs::read_dir(path).map_err(|e| TargetFailure::new(&shown, e.to_string()))?;

    let mut usage = Usage::default();
    let walker = WalkDir::new(path).min_depth(1).follow_links(false);

    for entry in walker {
        if cancel.is_cancelled() {
            tracing::debug!("统计被取消: {}", shown);
            break;
        }

        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!("跳过无法读取的项: {}", e);
                continue;
            }
        };

        if entry.file_type().is_dir() {
            continue;
        }

        let metadata = entry.metadata().ok();
        if !filter.is_empty() {
            let relative = entry
                .path()
                .strip_prefix(path)
                .map(utils::normalize_separators)
                .unwrap_or_default();
            let accepted = filter.accepts(
                &relative,
                metadata.as_ref().map(|m| m.len()),
                metadata.as_ref().and_then(|m| m.modified().ok()),
                now,
            );
            if !accepted {
                continue;
            }
        }

        usage.files += 1;
        usage.bytes += metadata.map(|m| m.len()).unwrap_or(0);
    }

    Ok(usage)
}
