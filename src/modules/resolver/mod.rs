//! 路径解析
//!
//! 把规则的解析策略展开为当前机器上具体的、带磁盘标识的目标。
//! 单个候选路径不存在只会少一个目标，不会报错；
//! 相同机器状态下重复解析得到相同（已排序、去重）的结果。

pub mod models;
pub mod safety;

use std::cell::Cell;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::modules::catalog::models::{FileFilter, Rule, Strategy};
use crate::modules::common::utils;
use crate::modules::platform::Platform;
use models::{ResolvedTarget, TargetLocation};
use safety::ProtectedLocations;

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// 残留扫描时跳过的厂商/系统目录（小写）
const RESIDUE_SKIPPED_DIRS: &[&str] = &[
    "microsoft",
    "microsoft.net",
    "microsoft office",
    "windows",
    "windowsapps",
    "windows defender",
    "windows mail",
    "windows media player",
    "windows nt",
    "windows photo viewer",
    "windowspowershell",
    "common files",
    "internet explorer",
    "modifiablewindowsapps",
    "reference assemblies",
    "packages",
    "package cache",
    "programs",
    "temp",
    "crashdumps",
    "connecteddevicesplatform",
    "d3dscache",
    "usoshared",
    "ssh",
];

pub struct Resolver {
    platform: Arc<dyn Platform>,
    protected: ProtectedLocations,
    residue_age_days: u64,
}

impl Resolver {
    pub fn new(platform: Arc<dyn Platform>, residue_age_days: u64) -> Self {
        let protected = ProtectedLocations::detect(platform.as_ref());
        Self {
            platform,
            protected,
            residue_age_days,
        }
    }

    pub fn platform(&self) -> &dyn Platform {
        self.platform.as_ref()
    }

    /// 解析规则
    pub fn resolve(&self, rule: &Rule) -> Vec<ResolvedTarget> {
        let mut targets = match &rule.strategy {
            Strategy::Path {
                path,
                filter,
                purge_root,
            } => self.resolve_path(rule, path, filter, *purge_root),
            Strategy::Profile { relative, filter } => {
                let bases = self.platform.user_profiles();
                self.resolve_relative(rule, &bases, relative, filter)
            }
            Strategy::Drive { relative, filter } => {
                let bases = self.platform.fixed_drives();
                self.resolve_relative(rule, &bases, relative, filter)
            }
            Strategy::Tool { program, args } => match self.platform.find_tool(program) {
                Some(program) => vec![ResolvedTarget {
                    rule_id: rule.id.clone(),
                    drive: None,
                    location: TargetLocation::Tool {
                        program,
                        args: args.clone(),
                    },
                    filter: FileFilter::default(),
                }],
                None => {
                    tracing::debug!("规则 {} 的外部工具 {} 不可用", rule.id, program);
                    Vec::new()
                }
            },
            Strategy::RegistryOrphans => self
                .platform
                .registry_orphans()
                .into_iter()
                .filter(|key| {
                    let critical = safety::is_critical_registry(key);
                    if critical {
                        tracing::warn!("跳过关键注册表项: {}", key);
                    }
                    !critical
                })
                .map(|key| ResolvedTarget {
                    rule_id: rule.id.clone(),
                    drive: None,
                    location: TargetLocation::RegistryKey { key },
                    filter: FileFilter::default(),
                })
                .collect(),
            Strategy::AppResidue { min_age_days } => {
                let days = min_age_days.unwrap_or(self.residue_age_days);
                let cutoff = Duration::from_secs(days.saturating_mul(SECS_PER_DAY));
                self.resolve_residue(rule, cutoff)
            }
        };

        targets.sort_by(|a, b| a.location.cmp(&b.location));
        targets.dedup_by(|a, b| a.location == b.location);

        tracing::debug!("规则 {} 解析到 {} 个目标", rule.id, targets.len());
        targets
    }

    fn resolve_path(
        &self,
        rule: &Rule,
        raw: &str,
        filter: &FileFilter,
        purge_root: bool,
    ) -> Vec<ResolvedTarget> {
        let wildcard = utils::has_wildcard(raw);
        let missing_var = Cell::new(false);
        let expanded = utils::expand_percent_env(raw, |key| match self.platform.env_var(key) {
            Some(value) if wildcard => Some(glob::Pattern::escape(&value)),
            Some(value) => Some(value),
            None => {
                missing_var.set(true);
                None
            }
        });

        if missing_var.get() {
            tracing::debug!("规则 {} 的路径含未定义的环境变量: {}", rule.id, raw);
            return Vec::new();
        }

        let candidates = expand_candidates(&to_native(&expanded), wildcard);
        self.path_targets(rule, candidates, filter, purge_root)
    }

    fn resolve_relative(
        &self,
        rule: &Rule,
        bases: &[PathBuf],
        relative: &str,
        filter: &FileFilter,
    ) -> Vec<ResolvedTarget> {
        let wildcard = utils::has_wildcard(relative);
        let relative = to_native(relative);

        let candidates = bases
            .iter()
            .flat_map(|base| {
                let base = base.to_string_lossy();
                let base = if wildcard {
                    glob::Pattern::escape(&base)
                } else {
                    base.to_string()
                };
                let joined = format!(
                    "{}{}{}",
                    base.trim_end_matches(['\\', '/']),
                    MAIN_SEPARATOR,
                    relative
                );
                expand_candidates(&joined, wildcard)
            })
            .collect();

        self.path_targets(rule, candidates, filter, false)
    }

    fn resolve_residue(&self, rule: &Rule, cutoff: Duration) -> Vec<ResolvedTarget> {
        let installed = self.platform.installed_locations();
        let now = SystemTime::now();
        let mut candidates = Vec::new();

        for root in self.platform.residue_roots() {
            let Ok(entries) = std::fs::read_dir(&root) else {
                continue;
            };

            for entry in entries.flatten() {
                let Ok(file_type) = entry.file_type() else {
                    continue;
                };
                if !file_type.is_dir() {
                    continue;
                }

                let name = entry.file_name().to_string_lossy().to_lowercase();
                if RESIDUE_SKIPPED_DIRS.contains(&name.as_str()) {
                    continue;
                }

                let path = entry.path();
                if is_linked_to_install(&path, &installed) {
                    continue;
                }

                let old_enough = entry
                    .metadata()
                    .and_then(|m| m.modified())
                    .ok()
                    .and_then(|modified| now.duration_since(modified).ok())
                    .map(|age| age >= cutoff)
                    .unwrap_or(false);
                if old_enough {
                    candidates.push(path);
                }
            }
        }

        self.path_targets(rule, candidates, &FileFilter::default(), true)
    }

    fn path_targets(
        &self,
        rule: &Rule,
        candidates: Vec<PathBuf>,
        filter: &FileFilter,
        purge_root: bool,
    ) -> Vec<ResolvedTarget> {
        candidates
            .into_iter()
            .filter(|path| {
                let protected = self.protected.is_protected(path);
                if protected {
                    tracing::warn!("规则 {} 跳过受保护位置: {}", rule.id, path.display());
                }
                !protected
            })
            .map(|path| ResolvedTarget {
                rule_id: rule.id.clone(),
                drive: self.platform.drive_of(&path),
                location: TargetLocation::Path {
                    path,
                    purge_root,
                    action: rule.action,
                },
                filter: filter.clone(),
            })
            .collect()
    }
}

/// 展开候选路径：含通配符时走 glob，否则只做一次存在性检查
fn expand_candidates(pattern: &str, wildcard: bool) -> Vec<PathBuf> {
    if !wildcard {
        let path = PathBuf::from(pattern);
        return match std::fs::symlink_metadata(&path) {
            Ok(_) => vec![path],
            Err(_) => Vec::new(),
        };
    }

    match glob::glob(pattern) {
        Ok(paths) => {
            let mut found: Vec<PathBuf> = paths.filter_map(|p| p.ok()).collect();
            found.sort();
            found
        }
        Err(e) => {
            tracing::debug!("通配符展开失败 {}: {}", pattern, e);
            Vec::new()
        }
    }
}

/// 目录与已安装程序有关联（互为祖先）
fn is_linked_to_install(path: &Path, installed: &[PathBuf]) -> bool {
    let candidate = path.to_string_lossy().to_lowercase();
    installed.iter().any(|location| {
        let location = location
            .to_string_lossy()
            .to_lowercase()
            .trim_end_matches(['\\', '/'])
            .to_string();
        candidate == location
            || candidate.starts_with(&format!("{}{}", location, MAIN_SEPARATOR))
            || location.starts_with(&format!("{}{}", candidate, MAIN_SEPARATOR))
    })
}

fn to_native(path: &str) -> String {
    path.chars()
        .map(|c| if c == '\\' || c == '/' { MAIN_SEPARATOR } else { c })
        .collect()
}
