use std::path::PathBuf;

use sysinfo::Disks;

use super::{Platform, ProcessSnapshot};

/// 真实系统实现
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemPlatform;

impl SystemPlatform {
    pub fn new() -> Self {
        Self
    }
}

impl Platform for SystemPlatform {
    fn fixed_drives(&self) -> Vec<PathBuf> {
        let disks = Disks::new_with_refreshed_list();
        let mut drives: Vec<PathBuf> = disks
            .list()
            .iter()
            .filter(|disk| !disk.is_removable())
            .map(|disk| disk.mount_point().to_path_buf())
            .collect();
        drives.sort();
        drives.dedup();
        drives
    }

    fn env_var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn is_elevated(&self) -> bool {
        is_process_elevated()
    }

    fn installed_locations(&self) -> Vec<PathBuf> {
        #[cfg(windows)]
        {
            super::registry::installed_locations()
        }
        #[cfg(not(windows))]
        {
            Vec::new()
        }
    }

    fn registry_orphans(&self) -> Vec<String> {
        #[cfg(windows)]
        {
            super::registry::orphan_uninstall_keys()
        }
        #[cfg(not(windows))]
        {
            Vec::new()
        }
    }

    fn process_snapshot(&self) -> ProcessSnapshot {
        ProcessSnapshot::capture()
    }
}

#[cfg(windows)]
fn is_process_elevated() -> bool {
    use windows::Win32::Foundation::{CloseHandle, HANDLE};
    use windows::Win32::Security::{
        GetTokenInformation, TokenElevation, TOKEN_ELEVATION, TOKEN_QUERY,
    };
    use windows::Win32::System::Threading::{GetCurrentProcess, OpenProcessToken};

    let mut token = HANDLE::default();
    // SAFETY: 伪句柄无需关闭；token 仅在本函数内使用并关闭
    unsafe {
        if OpenProcessToken(GetCurrentProcess(), TOKEN_QUERY, &mut token).is_err() {
            return false;
        }

        let mut elevation = TOKEN_ELEVATION::default();
        let mut returned = 0u32;
        let queried = GetTokenInformation(
            token,
            TokenElevation,
            Some(&mut elevation as *mut TOKEN_ELEVATION as *mut core::ffi::c_void),
            std::mem::size_of::<TOKEN_ELEVATION>() as u32,
            &mut returned,
        )
        .is_ok();
        let _ = CloseHandle(token);

        queried && elevation.TokenIsElevated != 0
    }
}

#[cfg(not(windows))]
fn is_process_elevated() -> bool {
    false
}
