//! 阻止检测
//!
//! 每次扫描/清理都会重新判定，结果不跨轮缓存。

use std::path::Path;

use serde::Serialize;

use crate::modules::catalog::models::{Rule, Strategy};
use crate::modules::platform::ProcessSnapshot;
use crate::modules::resolver::models::ResolvedTarget;

/// 便携版程序的标记文件（小写）
const PORTABLE_MARKERS: &[&str] = &[
    "portable",
    "portable.ini",
    "portable.txt",
    "portable.dat",
    ".portable",
];

/// 规则被阻止的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockReason {
    RequiresAdmin,
    ToolUnavailable { program: String },
    PortableApp { path: String },
}

impl std::fmt::Display for BlockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockReason::RequiresAdmin => write!(f, "需要管理员权限"),
            BlockReason::ToolUnavailable { program } => {
                write!(f, "外部工具不可用: {}", program)
            }
            BlockReason::PortableApp { path } => {
                write!(f, "检测到便携版程序数据: {}", path)
            }
        }
    }
}

impl Serialize for BlockReason {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// 规则在本轮是否可操作
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "AvailabilityView")]
pub enum Availability {
    Available,
    Blocked(BlockReason),
}

impl Availability {
    pub fn is_blocked(&self) -> bool {
        matches!(self, Availability::Blocked(_))
    }

    pub fn reason(&self) -> Option<&BlockReason> {
        match self {
            Availability::Available => None,
            Availability::Blocked(reason) => Some(reason),
        }
    }
}

impl From<Option<BlockReason>> for Availability {
    fn from(reason: Option<BlockReason>) -> Self {
        match reason {
            Some(reason) => Availability::Blocked(reason),
            None => Availability::Available,
        }
    }
}

#[derive(Serialize)]
struct AvailabilityView {
    blocked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    blocked_reason: Option<String>,
}

impl From<Availability> for AvailabilityView {
    fn from(availability: Availability) -> Self {
        AvailabilityView {
            blocked: availability.is_blocked(),
            blocked_reason: availability.reason().map(|r| r.to_string()),
        }
    }
}

/// "列出规则" 的返回项
#[derive(Debug, Clone, Serialize)]
pub struct EvaluatedRule {
    #[serde(flatten)]
    pub rule: Rule,
    #[serde(flatten)]
    pub availability: Availability,
}

/// 判定规则是否应被阻止
pub fn classify(
    rule: &Rule,
    targets: &[ResolvedTarget],
    elevated: bool,
    processes: &ProcessSnapshot,
) -> Option<BlockReason> {
    if rule.requires_admin && !elevated {
        return Some(BlockReason::RequiresAdmin);
    }

    if let Strategy::Tool { program, .. } = &rule.strategy {
        if targets.is_empty() {
            return Some(BlockReason::ToolUnavailable {
                program: program.clone(),
            });
        }
    }

    if rule.portable_guard {
        for target in targets {
            let Some(path) = target.path() else {
                continue;
            };
            if path.is_dir() && looks_portable(path, processes) {
                return Some(BlockReason::PortableApp {
                    path: path.to_string_lossy().to_string(),
                });
            }
        }
    }

    None
}

/// 目录是否为正在使用或自带可执行文件的便携版程序
fn looks_portable(dir: &Path, processes: &ProcessSnapshot) -> bool {
    if processes.has_process_under(dir) {
        tracing::debug!("目录下有运行中的进程: {}", dir.display());
        return true;
    }

    let Ok(entries) = std::fs::read_dir(dir) else {
        return false;
    };

    entries.flatten().any(|entry| {
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            return false;
        }
        let name = entry.file_name().to_string_lossy().to_lowercase();
        name.ends_with(".exe") || PORTABLE_MARKERS.contains(&name.as_str())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::catalog::Catalog;
    use crate::modules::catalog::models::{FileFilter, RemovalAction};
    use crate::modules::resolver::models::TargetLocation;
    use std::fs;
    use std::path::PathBuf;

    fn catalog() -> Catalog {
        let json = r#"{"version":1,"rules":[
            {"id":"admin","title":"t","description":"d","category":"system","risk":"medium","requires_admin":true,"strategy":{"kind":"path","path":"%SystemRoot%\\Temp"}},
            {"id":"tool","title":"t","description":"d","category":"system","risk":"high","strategy":{"kind":"tool","program":"dism.exe","args":["/Online"]}},
            {"id":"guarded","title":"t","description":"d","category":"apps","risk":"low","portable_guard":true,"strategy":{"kind":"profile","relative":"AppData\\Roaming\\Telegram Desktop"}},
            {"id":"plain","title":"t","description":"d","category":"cache","risk":"low","strategy":{"kind":"profile","relative":"AppData\\Roaming\\Telegram Desktop"}}
        ]}"#;
        Catalog::from_json(json).expect("catalog")
    }

    fn dir_target(rule_id: &str, path: PathBuf) -> ResolvedTarget {
        ResolvedTarget {
            rule_id: rule_id.to_string(),
            drive: Some("C:".to_string()),
            location: TargetLocation::Path {
                path,
                purge_root: false,
                action: RemovalAction::Delete,
            },
            filter: FileFilter::default(),
        }
    }

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("winsweep-blocker-{}", uuid::Uuid::new_v4()));
        assert!(fs::create_dir_all(&dir).is_ok());
        dir
    }

    #[test]
    fn admin_rule_is_blocked_only_without_elevation() {
        let catalog = catalog();
        let rule = catalog.get("admin").expect("rule");
        let snapshot = ProcessSnapshot::empty();

        assert_eq!(
            classify(&rule, &[], false, &snapshot),
            Some(BlockReason::RequiresAdmin)
        );
        assert_eq!(classify(&rule, &[], true, &snapshot), None);
    }

    #[test]
    fn tool_without_targets_is_blocked() {
        let catalog = catalog();
        let rule = catalog.get("tool").expect("rule");
        let reason = classify(&rule, &[], true, &ProcessSnapshot::empty());
        assert!(matches!(reason, Some(BlockReason::ToolUnavailable { ref program }) if program == "dism.exe"));
    }

    #[test]
    fn portable_markers_block_guarded_rules_only() {
        let dir = temp_dir();
        assert!(fs::write(dir.join("Telegram.exe"), b"MZ").is_ok());
        let catalog = catalog();
        let snapshot = ProcessSnapshot::empty();

        let guarded = catalog.get("guarded").expect("rule");
        let reason = classify(&guarded, &[dir_target("guarded", dir.clone())], false, &snapshot);
        assert!(matches!(reason, Some(BlockReason::PortableApp { .. })));

        let plain = catalog.get("plain").expect("rule");
        assert_eq!(
            classify(&plain, &[dir_target("plain", dir.clone())], false, &snapshot),
            None
        );

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn running_process_blocks_guarded_rule() {
        let dir = temp_dir();
        assert!(fs::write(dir.join("cache.bin"), b"data").is_ok());
        let catalog = catalog();
        let guarded = catalog.get("guarded").expect("rule");
        let targets = [dir_target("guarded", dir.clone())];

        assert_eq!(classify(&guarded, &targets, false, &ProcessSnapshot::empty()), None);

        let running = dir.join("bin").join("app");
        let snapshot = ProcessSnapshot::from_command_paths([running.to_string_lossy()]);
        assert!(classify(&guarded, &targets, false, &snapshot).is_some());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn evaluated_rule_serializes_flat() {
        let catalog = catalog();
        let rule = catalog.get("admin").expect("rule");
        let evaluated = EvaluatedRule {
            rule: (*rule).clone(),
            availability: Availability::from(Some(BlockReason::RequiresAdmin)),
        };
        let value = serde_json::to_value(&evaluated).expect("json");
        assert_eq!(value["id"], "admin");
        assert_eq!(value["category"], "system");
        assert_eq!(value["blocked"], true);
        assert_eq!(value["blocked_reason"], "需要管理员权限");
        assert!(value.get("strategy").is_none());

        let open = EvaluatedRule {
            rule: (*rule).clone(),
            availability: Availability::Available,
        };
        let value = serde_json::to_value(&open).expect("json");
        assert_eq!(value["blocked"], false);
        assert!(value.get("blocked_reason").is_none());
    }
}
