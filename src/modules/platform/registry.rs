//! 卸载注册表读取

use std::path::{Path, PathBuf};

use winreg::enums::*;
use winreg::RegKey;

/// (根键, 根键前缀, 卸载子键路径)
const UNINSTALL_ROOTS: &[(winreg::HKEY, &str, &str)] = &[
    (
        HKEY_LOCAL_MACHINE,
        "HKLM",
        r"SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall",
    ),
    (
        HKEY_LOCAL_MACHINE,
        "HKLM",
        r"SOFTWARE\WOW6432Node\Microsoft\Windows\CurrentVersion\Uninstall",
    ),
    (
        HKEY_CURRENT_USER,
        "HKCU",
        r"SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall",
    ),
];

/// 所有卸载项登记的 InstallLocation
pub fn installed_locations() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    for (hkey, _, path) in UNINSTALL_ROOTS {
        let uninstall = match RegKey::predef(*hkey).open_subkey_with_flags(path, KEY_READ) {
            Ok(key) => key,
            Err(e) => {
                tracing::debug!("无法打开注册表路径 {}: {}", path, e);
                continue;
            }
        };

        for name in uninstall.enum_keys().filter_map(|k| k.ok()) {
            if let Ok(app) = uninstall.open_subkey_with_flags(&name, KEY_READ) {
                if let Ok(location) = app.get_value::<String, _>("InstallLocation") {
                    let location = location.trim().trim_matches('"');
                    if !location.is_empty() {
                        paths.push(PathBuf::from(location));
                    }
                }
            }
        }
    }

    paths
}

/// 安装目录缺失且缺少名称或卸载命令的卸载项
pub fn orphan_uninstall_keys() -> Vec<String> {
    let mut orphans = Vec::new();

    for (hkey, prefix, path) in UNINSTALL_ROOTS {
        let Ok(uninstall) = RegKey::predef(*hkey).open_subkey_with_flags(path, KEY_READ) else {
            continue;
        };

        for name in uninstall.enum_keys().filter_map(|k| k.ok()) {
            let Ok(app) = uninstall.open_subkey_with_flags(&name, KEY_READ) else {
                continue;
            };

            let blank = |value: Result<String, std::io::Error>| {
                value.map(|s| s.trim().is_empty()).unwrap_or(true)
            };

            let install_missing = app
                .get_value::<String, _>("InstallLocation")
                .map(|s| s.trim().is_empty() || !Path::new(s.trim()).exists())
                .unwrap_or(true);
            let display_missing = blank(app.get_value("DisplayName"));
            let uninstall_missing = blank(app.get_value("UninstallString"));

            if install_missing && (display_missing || uninstall_missing) {
                orphans.push(format!(r"{}\{}\{}", prefix, path, name));
            }
        }
    }

    orphans.sort();
    orphans
}
