use super::models::Removal;
use crate::modules::resolver::safety;
use crate::modules::scanner::models::Usage;

/// 删除注册表键，键不存在视为成功
pub fn remove_key(key: &str) -> Removal {
    if safety::is_critical_registry(key) {
        return Removal::failed(format!("不能删除关键系统注册表项: {}", key));
    }

    match delete_key(key) {
        Ok(()) => {
            tracing::info!("已删除注册表项: {}", key);
            Removal {
                freed: Usage::new(0, 1),
                ..Removal::default()
            }
        }
        Err(e) => {
            tracing::error!("删除注册表失败 {}: {}", key, e);
            Removal::failed(format!("{}: {}", key, e))
        }
    }
}

#[cfg(windows)]
fn delete_key(key: &str) -> Result<(), crate::modules::common::error::SweepError> {
    use crate::modules::common::error::SweepError;
    use winreg::RegKey;

    let (hkey, subkey) = parse_registry_path(key)
        .ok_or_else(|| SweepError::Registry(format!("无效的注册表路径格式: {}", key)))?;

    match RegKey::predef(hkey).delete_subkey_all(subkey) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(SweepError::PermissionDenied(e.to_string()))
        }
        Err(e) => Err(SweepError::Registry(e.to_string())),
    }
}

#[cfg(not(windows))]
fn delete_key(key: &str) -> Result<(), crate::modules::common::error::SweepError> {
    Err(crate::modules::common::error::SweepError::Unsupported(format!(
        "注册表: {}",
        key
    )))
}

/// 拆分根键与子键路径
#[cfg(windows)]
fn parse_registry_path(path: &str) -> Option<(winreg::HKEY, &str)> {
    use winreg::enums::*;

    const ROOTS: &[(&str, winreg::HKEY)] = &[
        ("HKLM\\", HKEY_LOCAL_MACHINE),
        ("HKEY_LOCAL_MACHINE\\", HKEY_LOCAL_MACHINE),
        ("HKCU\\", HKEY_CURRENT_USER),
        ("HKEY_CURRENT_USER\\", HKEY_CURRENT_USER),
        ("HKCR\\", HKEY_CLASSES_ROOT),
        ("HKEY_CLASSES_ROOT\\", HKEY_CLASSES_ROOT),
        ("HKU\\", HKEY_USERS),
        ("HKEY_USERS\\", HKEY_USERS),
    ];

    let path = path.trim();
    ROOTS.iter().find_map(|(prefix, hkey)| {
        path.strip_prefix(prefix)
            .filter(|rest| !rest.trim_matches('\\').is_empty())
            .map(|rest| (*hkey, rest))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::cleaner::models::RemovalOutcome;

    #[test]
    fn critical_keys_are_refused() {
        let removal = remove_key(r"HKLM\SYSTEM\CurrentControlSet");
        assert_eq!(removal.outcome(), RemovalOutcome::Failed);
    }

    #[cfg(not(windows))]
    #[test]
    fn registry_is_unsupported_elsewhere() {
        let removal = remove_key(r"HKCU\Software\Microsoft\Windows\CurrentVersion\Uninstall\x");
        assert_eq!(removal.outcome(), RemovalOutcome::Failed);
    }

    #[cfg(windows)]
    #[test]
    fn registry_paths_split_into_root_and_subkey() {
        assert!(parse_registry_path(r"HKLM\SOFTWARE\Foo").is_some_and(|(_, p)| p == r"SOFTWARE\Foo"));
        assert!(parse_registry_path(r"HKEY_CURRENT_USER\Software\Foo")
            .is_some_and(|(_, p)| p == r"Software\Foo"));
        assert!(parse_registry_path(r"HKLM\").is_none());
        assert!(parse_registry_path(r"Software\Foo").is_none());
    }
}
