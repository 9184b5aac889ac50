//! 平台抽象层
//!
//! 磁盘枚举、用户目录展开、权限与外部工具探测、注册表读取都在这里，
//! 扫描与清理逻辑只依赖 [`Platform`]，测试可以替换为假实现。

pub mod process_snapshot;
pub mod system;

#[cfg(windows)]
pub mod registry;

use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;

use crate::modules::cleaner::models::Removal;
use crate::modules::resolver::models::ResolvedTarget;
use crate::modules::scanner::models::{TargetFailure, Usage};
pub use process_snapshot::ProcessSnapshot;
pub use system::SystemPlatform;

/// 不视为普通用户的配置目录
pub const SKIPPED_PROFILES: &[&str] = &["public", "default", "default user", "all users"];

/// 卸载残留扫描的根目录环境变量
pub const RESIDUE_ROOT_VARS: &[&str] = &[
    "ProgramFiles",
    "ProgramFiles(x86)",
    "ProgramData",
    "LOCALAPPDATA",
    "APPDATA",
];

pub trait Platform: Send + Sync {
    /// 固定（不可移除）本地磁盘的根目录，结果有序
    fn fixed_drives(&self) -> Vec<PathBuf>;

    fn env_var(&self, key: &str) -> Option<String>;

    /// 当前进程是否拥有管理员权限
    fn is_elevated(&self) -> bool;

    /// 在 PATH 中查找外部工具
    fn find_tool(&self, program: &str) -> Option<PathBuf> {
        let candidate = Path::new(program);
        if candidate.is_absolute() {
            return candidate.is_file().then(|| candidate.to_path_buf());
        }

        let paths = self.env_var("PATH")?;
        std::env::split_paths(&paths)
            .flat_map(|dir| {
                let exe = dir.join(format!("{}.exe", program));
                [dir.join(program), exe]
            })
            .find(|p| p.is_file())
    }

    /// 卸载注册表中登记的安装目录
    fn installed_locations(&self) -> Vec<PathBuf>;

    /// 孤立的卸载注册表项（带根键前缀的完整路径）
    fn registry_orphans(&self) -> Vec<String>;

    /// 当前运行进程的快照
    fn process_snapshot(&self) -> ProcessSnapshot;

    /// 每个固定磁盘上的用户配置目录
    fn user_profiles(&self) -> Vec<PathBuf> {
        let mut profiles = Vec::new();
        for drive in self.fixed_drives() {
            let users = drive.join("Users");
            let Ok(entries) = std::fs::read_dir(&users) else {
                continue;
            };
            for entry in entries.flatten() {
                let name = entry.file_name().to_string_lossy().to_lowercase();
                if SKIPPED_PROFILES.contains(&name.as_str()) {
                    continue;
                }
                if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                    profiles.push(entry.path());
                }
            }
        }
        profiles.sort();
        profiles
    }

    /// 卸载残留扫描的根目录
    fn residue_roots(&self) -> Vec<PathBuf> {
        let mut roots: Vec<PathBuf> = RESIDUE_ROOT_VARS
            .iter()
            .filter_map(|key| self.env_var(key))
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .collect();
        roots.sort();
        roots.dedup();
        roots
    }

    /// 路径所在磁盘的标识
    fn drive_of(&self, path: &Path) -> Option<String> {
        if let Some(letter) = crate::modules::common::utils::drive_letter(path) {
            return Some(letter);
        }

        // 非盘符路径取包含它的最长挂载点
        self.fixed_drives()
            .into_iter()
            .filter(|root| path.starts_with(root))
            .max_by_key(|root| root.as_os_str().len())
            .map(|root| root.to_string_lossy().to_string())
    }

    /// 统计目标占用
    fn measure(
        &self,
        target: &ResolvedTarget,
        cancel: &CancellationToken,
    ) -> Result<Usage, TargetFailure> {
        crate::modules::scanner::measure_target(target, cancel)
    }

    /// 删除目标
    fn remove(&self, target: &ResolvedTarget, cancel: &CancellationToken) -> Removal {
        crate::modules::cleaner::remove_target(target, cancel)
    }
}
