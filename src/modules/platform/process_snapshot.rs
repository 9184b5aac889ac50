use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use sysinfo::System;

/// 单次扫描/清理开始时采集的进程快照
#[derive(Debug, Clone, Default)]
pub struct ProcessSnapshot {
    command_paths: Arc<HashSet<String>>,
}

impl ProcessSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    /// 由命令行路径构造（测试与假平台使用）
    pub fn from_command_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let command_paths = paths
            .into_iter()
            .map(|p| normalize(p.as_ref()))
            .collect();
        Self {
            command_paths: Arc::new(command_paths),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.command_paths.is_empty()
    }

    /// 是否有进程的可执行文件或参数路径位于 dir 下
    pub fn has_process_under(&self, dir: &Path) -> bool {
        if self.command_paths.is_empty() {
            return false;
        }
        let mut prefix = normalize(&dir.to_string_lossy());
        if !prefix.ends_with('/') {
            prefix.push('/');
        }
        self.command_paths.iter().any(|cmd| cmd.starts_with(&prefix))
    }

    /// 采集系统进程（阻塞调用）
    pub fn capture() -> Self {
        let snapshot = capture_snapshot();
        tracing::debug!(
            "进程快照: {} 条命令行路径",
            snapshot.command_paths.len()
        );
        snapshot
    }
}

fn normalize(path: &str) -> String {
    path.trim_matches('"').replace('\\', "/").to_lowercase()
}

fn capture_snapshot() -> ProcessSnapshot {
    let mut system = System::new();
    system.refresh_processes();

    let mut command_paths = HashSet::new();

    for process in system.processes().values() {
        for arg in process.cmd() {
            if arg.contains('/') || arg.contains('\\') {
                command_paths.insert(normalize(arg));
            }
        }
    }

    ProcessSnapshot {
        command_paths: Arc::new(command_paths),
    }
}
