use std::fs;
use std::io;
use std::path::Path;
use std::time::SystemTime;

use tokio_util::sync::CancellationToken;
use walkdir::WalkDir;

use super::models::Removal;
use crate::modules::catalog::models::{FileFilter, RemovalAction};
use crate::modules::common::utils;

/// 删除路径目标
///
/// 逐个删除（或移入回收站）文件，无过滤条件时自底向上删除清空的子目录，
/// 目标根目录只在 purge_root 时删除。已删除的部分不回滚。
pub fn remove_path(
    path: &Path,
    filter: &FileFilter,
    purge_root: bool,
    action: RemovalAction,
    cancel: &CancellationToken,
) -> Removal {
    let shown = path.to_string_lossy().to_string();
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        // 目标已不存在，视为成功
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Removal::default(),
        Err(e) => return Removal::failed(format!("{}: {}", shown, e)),
    };
    let now = SystemTime::now();
    let mut removal = Removal::default();

    if !metadata.is_dir() {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if !filter.accepts(&name, Some(metadata.len()), metadata.modified().ok(), now) {
            return removal;
        }
        match remove_file(path, action) {
            Ok(()) => {
                removal.freed.bytes = metadata.len();
                removal.freed.files = 1;
                tracing::info!("已删除: {}", shown);
            }
            Err(e) => {
                tracing::warn!("删除失败 {}: {}", shown, e);
                removal.failures.push(format!("{}: {}", shown, e));
            }
        }
        return removal;
    }

    let walker = WalkDir::new(path)
        .min_depth(1)
        .follow_links(false)
        .contents_first(true);

    for entry in walker {
        if cancel.is_cancelled() {
            removal.interrupted = true;
            break;
        }

        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("无法读取: {}", e);
                removal.failures.push(e.to_string());
                continue;
            }
        };
        let entry_path = entry.path();

        if entry.file_type().is_dir() {
            // 目录不占空间；非空（有删除失败的子项）时保留
            if filter.is_empty() {
                if let Err(e) = fs::remove_dir(entry_path) {
                    tracing::debug!("保留目录 {}: {}", entry_path.display(), e);
                }
            }
            continue;
        }

        let metadata = entry.metadata().ok();
        let len = metadata.as_ref().map(|m| m.len());
        if !filter.is_empty() {
            let relative = entry_path
                .strip_prefix(path)
                .map(utils::normalize_separators)
                .unwrap_or_default();
            let modified = metadata.as_ref().and_then(|m| m.modified().ok());
            if !filter.accepts(&relative, len, modified, now) {
                continue;
            }
        }

        match remove_file(entry_path, action) {
            Ok(()) => {
                removal.freed.bytes += len.unwrap_or(0);
                removal.freed.files += 1;
                tracing::debug!("已删除: {}", entry_path.display());
            }
            Err(e) => {
                tracing::warn!("删除失败 {}: {}", entry_path.display(), e);
                removal
                    .failures
                    .push(format!("{}: {}", entry_path.display(), e));
            }
        }
    }

    if purge_root && filter.is_empty() && !removal.interrupted && removal.failures.is_empty() {
        if let Err(e) = fs::remove_dir(path) {
            tracing::warn!("删除目录失败 {}: {}", shown, e);
            removal.failures.push(format!("{}: {}", shown, e));
        }
    }

    tracing::info!(
        "已清理 {}: {} 个文件, {}",
        shown,
        removal.freed.files,
        utils::format_size(removal.freed.bytes)
    );

    removal
}

fn remove_file(path: &Path, action: RemovalAction) -> io::Result<()> {
    match action {
        RemovalAction::Delete => unlink(path),
        RemovalAction::Recycle => {
            trash::delete(path).map_err(|e| io::Error::other(e.to_string()))
        }
    }
}

/// 删除文件，只读属性会先被清除
fn unlink(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        #[cfg(windows)]
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            let mut permissions = fs::symlink_metadata(path)?.permissions();
            if !permissions.readonly() {
                return Err(e);
            }
            permissions.set_readonly(false);
            fs::set_permissions(path, permissions)?;
            fs::remove_file(path)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::cleaner::models::RemovalOutcome;
    use std::path::PathBuf;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("winsweep-remove-{}", uuid::Uuid::new_v4()));
        assert!(fs::create_dir_all(&dir).is_ok());
        dir
    }

    fn delete(path: &Path, filter: &FileFilter, purge_root: bool) -> Removal {
        remove_path(
            path,
            filter,
            purge_root,
            RemovalAction::Delete,
            &CancellationToken::new(),
        )
    }

    fn populate(dir: &Path) {
        assert!(fs::create_dir_all(dir.join("nested/deeper")).is_ok());
        assert!(fs::write(dir.join("a.tmp"), vec![0u8; 10]).is_ok());
        assert!(fs::write(dir.join("nested/b.log"), vec![0u8; 20]).is_ok());
        assert!(fs::write(dir.join("nested/deeper/c.tmp"), vec![0u8; 30]).is_ok());
    }

    #[test]
    fn clears_contents_but_keeps_root() {
        let dir = temp_dir();
        populate(&dir);

        let removal = delete(&dir, &FileFilter::default(), false);
        assert_eq!(removal.outcome(), RemovalOutcome::Removed);
        assert_eq!((removal.freed.bytes, removal.freed.files), (60, 3));
        assert!(dir.exists());
        assert_eq!(fs::read_dir(&dir).map(|d| d.count()).unwrap_or(99), 0);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn purge_root_removes_directory_itself() {
        let dir = temp_dir();
        populate(&dir);

        let removal = delete(&dir, &FileFilter::default(), true);
        assert_eq!(removal.outcome(), RemovalOutcome::Removed);
        assert!(!dir.exists());
    }

    #[test]
    fn filter_limits_what_is_deleted() {
        let dir = temp_dir();
        populate(&dir);
        let filter = FileFilter {
            pattern: glob::Pattern::new("**/*.tmp").ok(),
            ..FileFilter::default()
        };

        let removal = delete(&dir, &filter, true);
        assert_eq!((removal.freed.bytes, removal.freed.files), (40, 2));
        assert!(dir.join("nested/b.log").exists());
        assert!(dir.join("nested/deeper").exists());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_target_counts_as_removed() {
        let dir = temp_dir().join("already-gone");
        let removal = delete(&dir, &FileFilter::default(), false);
        assert_eq!(removal.outcome(), RemovalOutcome::Removed);
        assert_eq!(removal.freed.bytes, 0);
    }

    #[test]
    fn cancellation_keeps_committed_deletions() {
        let dir = temp_dir();
        populate(&dir);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let removal = remove_path(
            &dir,
            &FileFilter::default(),
            true,
            RemovalAction::Delete,
            &cancel,
        );
        assert!(removal.interrupted);
        assert!(dir.exists());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn recycled_files_are_counted_only_when_moved() {
        let dir = temp_dir();
        let file = dir.join("old.log");
        assert!(fs::write(&file, vec![0u8; 42]).is_ok());

        let removal = remove_path(
            &file,
            &FileFilter::default(),
            false,
            RemovalAction::Recycle,
            &CancellationToken::new(),
        );

        // 没有可用回收站的环境下移动会失败，此时文件保留且不计入释放量
        if file.exists() {
            assert_eq!(removal.outcome(), RemovalOutcome::Failed);
            assert_eq!(removal.freed.bytes, 0);
        } else {
            assert_eq!(removal.outcome(), RemovalOutcome::Removed);
            assert_eq!((removal.freed.bytes, removal.freed.files), (42, 1));
        }

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn outcome_distinguishes_partial_from_failed() {
        let partial = Removal {
            freed: crate::modules::scanner::models::Usage::new(5, 1),
            failures: vec!["locked".to_string()],
            interrupted: false,
        };
        assert_eq!(partial.outcome(), RemovalOutcome::PartiallyRemoved);
        assert_eq!(Removal::failed("denied").outcome(), RemovalOutcome::Failed);
    }
}
