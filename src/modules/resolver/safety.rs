//! 受保护位置
//!
//! 解析结果中命中这些位置的目标会被丢弃，引擎永远不会删除它们。

use std::path::{Path, PathBuf};

use crate::modules::platform::Platform;

/// 系统目录下按前缀保护的子目录
const CRITICAL_SYSTEM_SUBDIRS: &[&str] = &[
    "System32",
    "SysWOW64",
    "WinSxS",
    "Boot",
    "servicing",
];

/// 关键注册表路径
const CRITICAL_REGISTRY_PATHS: &[&str] = &[
    r"HKLM\SYSTEM",
    r"HKLM\SOFTWARE\Microsoft\Windows NT\CurrentVersion",
    r"HKLM\SOFTWARE\Microsoft\Windows\CurrentVersion\Run",
    r"HKLM\SOFTWARE\Microsoft\Windows\CurrentVersion\RunOnce",
    r"HKLM\SOFTWARE\WOW6432Node\Microsoft\Windows\CurrentVersion\Run",
    r"HKCR\*",
    r"HKLM\BOOT",
    r"HKLM\SAM",
    r"HKLM\SECURITY",
];

/// 当前机器上的受保护位置
#[derive(Debug, Clone, Default)]
pub struct ProtectedLocations {
    /// 自身及其祖先都不能删除
    containers: Vec<String>,
    /// 其下任何内容都不能删除
    subtrees: Vec<String>,
}

impl ProtectedLocations {
    pub fn detect(platform: &dyn Platform) -> Self {
        let mut containers: Vec<PathBuf> = Vec::new();
        let mut subtrees: Vec<PathBuf> = Vec::new();

        let system_root = platform
            .env_var("SystemRoot")
            .or_else(|| platform.env_var("windir"));
        if let Some(root) = system_root {
            let root = PathBuf::from(root);
            for sub in CRITICAL_SYSTEM_SUBDIRS {
                subtrees.push(root.join(sub));
            }
            containers.push(root);
        }

        for key in ["ProgramFiles", "ProgramFiles(x86)", "ProgramData", "USERPROFILE", "HOME"] {
            if let Some(value) = platform.env_var(key).filter(|v| !v.trim().is_empty()) {
                containers.push(PathBuf::from(value));
            }
        }

        for drive in platform.fixed_drives() {
            containers.push(drive.join("Users"));
            containers.push(drive);
        }
        containers.extend(platform.user_profiles());
        containers.extend(platform.residue_roots());

        Self {
            containers: containers.iter().map(|p| normalize(p)).collect(),
            subtrees: subtrees.iter().map(|p| normalize(p)).collect(),
        }
    }

    /// 路径是否受保护
    pub fn is_protected(&self, path: &Path) -> bool {
        // 磁盘根目录或文件系统根
        if path.parent().is_none() {
            return true;
        }

        let candidate = normalize(path);
        if candidate.is_empty() {
            return true;
        }

        let is_same_or_ancestor = self.containers.iter().any(|container| {
            container == &candidate || container.starts_with(&format!("{}/", candidate))
        });
        if is_same_or_ancestor {
            return true;
        }

        self.subtrees.iter().any(|tree| {
            &candidate == tree
                || candidate.starts_with(&format!("{}/", tree))
                || tree.starts_with(&format!("{}/", candidate))
        })
    }
}

/// 检查是否为关键注册表路径
pub fn is_critical_registry(key: &str) -> bool {
    let key_upper = key.to_uppercase();
    CRITICAL_REGISTRY_PATHS
        .iter()
        .any(|critical| key_upper.starts_with(&critical.to_uppercase()))
}

fn normalize(path: &Path) -> String {
    let text = path.to_string_lossy().replace('\\', "/").to_lowercase();
    let trimmed = text.trim_end_matches('/');
    trimmed.to_string()
}
