#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use winsweep_lib::modules::cleaner;
use winsweep_lib::modules::cleaner::models::Removal;
use winsweep_lib::modules::scanner;
use winsweep_lib::modules::scanner::models::{TargetFailure, Usage};
use winsweep_lib::modules::resolver::models::ResolvedTarget;
use winsweep_lib::{Catalog, Engine, EngineConfig, Platform, ProcessSnapshot};

pub const MB: u64 = 1024 * 1024;
pub const GB: u64 = 1024 * MB;

/// 以临时目录模拟一台机器: <root>/c 与 <root>/d 两个固定磁盘
pub struct FakePlatform {
    pub root: PathBuf,
    pub env: HashMap<String, String>,
    pub elevated: bool,
    /// 删除时返回“拒绝访问”的目标
    pub locked: HashSet<PathBuf>,
    /// 统计时返回“拒绝访问”的目标
    pub unreadable: HashSet<PathBuf>,
    pub processes: ProcessSnapshot,
}

impl FakePlatform {
    pub fn new(root: &Path) -> Self {
        let mut env = HashMap::new();
        let set = |env: &mut HashMap<String, String>, key: &str, path: PathBuf| {
            env.insert(key.to_string(), path.to_string_lossy().to_string());
        };
        set(&mut env, "SystemRoot", root.join("c").join("Windows"));
        set(&mut env, "USERPROFILE", root.join("c").join("Users").join("alice"));
        set(
            &mut env,
            "LOCALAPPDATA",
            root.join("c").join("Users").join("alice").join("AppData").join("Local"),
        );

        Self {
            root: root.to_path_buf(),
            env,
            elevated: false,
            locked: HashSet::new(),
            unreadable: HashSet::new(),
            processes: ProcessSnapshot::empty(),
        }
    }
}

impl Platform for FakePlatform {
    fn fixed_drives(&self) -> Vec<PathBuf> {
        vec![self.root.join("c"), self.root.join("d")]
    }

    fn env_var(&self, key: &str) -> Option<String> {
        self.env.get(key).cloned()
    }

    fn is_elevated(&self) -> bool {
        self.elevated
    }

    fn installed_locations(&self) -> Vec<PathBuf> {
        Vec::new()
    }

    fn registry_orphans(&self) -> Vec<String> {
        Vec::new()
    }

    fn process_snapshot(&self) -> ProcessSnapshot {
        self.processes.clone()
    }

    fn drive_of(&self, path: &Path) -> Option<String> {
        if path.starts_with(self.root.join("c")) {
            Some("C:".to_string())
        } else if path.starts_with(self.root.join("d")) {
            Some("D:".to_string())
        } else {
            None
        }
    }

    fn measure(
        &self,
        target: &ResolvedTarget,
        cancel: &CancellationToken,
    ) -> Result<Usage, TargetFailure> {
        match target.path() {
            Some(path) if self.unreadable.contains(path) => Err(TargetFailure::new(
                path.to_string_lossy(),
                "拒绝访问",
            )),
            _ => scanner::measure_target(target, cancel),
        }
    }

    fn remove(&self, target: &ResolvedTarget, cancel: &CancellationToken) -> Removal {
        match target.path() {
            Some(path) if self.locked.contains(path) => {
                Removal::failed(format!("{}: 拒绝访问", path.display()))
            }
            _ => cleaner::remove_target(target, cancel),
        }
    }
}

pub struct TestMachine {
    pub dir: TempDir,
    pub platform: FakePlatform,
}

impl TestMachine {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        let platform = FakePlatform::new(dir.path());
        fs::create_dir_all(dir.path().join("c").join("Users").join("alice"))
            .expect("create profile");
        fs::create_dir_all(dir.path().join("d")).expect("create drive d");
        Self { dir, platform }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn local_app_data(&self) -> PathBuf {
        self.root()
            .join("c")
            .join("Users")
            .join("alice")
            .join("AppData")
            .join("Local")
    }

    /// 创建稀疏文件，大文件场景不占真实磁盘
    pub fn sparse_file(&self, path: &Path, len: u64) -> PathBuf {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        let file = fs::File::create(path).expect("create file");
        file.set_len(len).expect("set len");
        path.to_path_buf()
    }

    pub fn engine(self, catalog_json: &str) -> (Engine, TempDir) {
        let catalog = Catalog::from_json(catalog_json).expect("catalog");
        let config = EngineConfig {
            workers: 4,
            data_dir: self.dir.path().join("data"),
            residue_age_days: 180,
            catalog_path: None,
        };
        let engine = Engine::with_parts(catalog, Arc::new(self.platform), config);
        (engine, self.dir)
    }
}

pub fn rule(id: &str, category: &str, extra: &str, strategy: &str) -> String {
    format!(
        r#"{{"id":"{id}","title":"rules.{id}.title","description":"rules.{id}.description","category":"{category}","risk":"low"{extra},"strategy":{strategy}}}"#
    )
}

pub fn catalog(rules: &[String]) -> String {
    format!(r#"{{"version":1,"rules":[{}]}}"#, rules.join(","))
}
