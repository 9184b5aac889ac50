//! 规则目录
//!
//! 进程启动时加载一次，之后只读。单条规则损坏只会剔除该规则，
//! 整个文档无法解析才算加载失败。

pub mod models;

use std::collections::HashSet;
use std::path::{Component, Path};
use std::sync::Arc;
use std::time::Duration;

use crate::modules::common::config::EngineConfig;
use crate::modules::common::error::SweepError;
use crate::modules::common::utils;
use models::{
    CatalogDocument, FileFilter, ResolutionFailure, Rule, RuleDefinition, Strategy,
    StrategyDefinition,
};

const BUILTIN_RULES: &str = include_str!("rules.json");

const SECS_PER_DAY: u64 = 24 * 60 * 60;
const BYTES_PER_MB: u64 = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Catalog {
    version: u32,
    rules: Vec<Arc<Rule>>,
    rejected: Vec<ResolutionFailure>,
}

impl Catalog {
    /// 内置规则目录
    pub fn builtin() -> Result<Self, SweepError> {
        Self::from_json(BUILTIN_RULES)
    }

    /// 按配置加载：指定了 catalog_path 时替换内置目录
    pub fn load(config: &EngineConfig) -> Result<Self, SweepError> {
        match &config.catalog_path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    SweepError::Catalog(format!("读取规则文件失败 {}: {}", path.display(), e))
                })?;
                Self::from_json(&content)
            }
            None => Self::builtin(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, SweepError> {
        let document: CatalogDocument = serde_json::from_str(json)
            .map_err(|e| SweepError::Catalog(format!("规则目录格式错误: {}", e)))?;

        let mut rules: Vec<Rule> = Vec::with_capacity(document.rules.len());
        let mut rejected = Vec::new();
        let mut seen_ids = HashSet::new();

        for raw in document.rules {
            let raw_id = raw
                .get("id")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string());

            let definition: RuleDefinition = match serde_json::from_value(raw) {
                Ok(definition) => definition,
                Err(e) => {
                    rejected.push(ResolutionFailure {
                        rule_id: raw_id,
                        reason: format!("规则定义无效: {}", e),
                    });
                    continue;
                }
            };

            if !seen_ids.insert(definition.id.clone()) {
                rejected.push(ResolutionFailure {
                    rule_id: Some(definition.id.clone()),
                    reason: "规则 ID 重复".to_string(),
                });
                continue;
            }

            match compile_rule(definition) {
                Ok(rule) => rules.push(rule),
                Err(failure) => rejected.push(failure),
            }
        }

        for failure in &rejected {
            tracing::warn!("已剔除无法求值的规则 {}", failure);
        }

        // 稳定排序，sort_order 相同时保持目录中的顺序
        rules.sort_by_key(|rule| rule.sort_order);

        tracing::debug!(
            "规则目录 v{} 已加载: {} 条有效, {} 条剔除",
            document.version,
            rules.len(),
            rejected.len()
        );

        Ok(Self {
            version: document.version,
            rules: rules.into_iter().map(Arc::new).collect(),
            rejected,
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// 所有未退役的规则
    pub fn rules(&self) -> Vec<Arc<Rule>> {
        self.rules.iter().filter(|r| !r.retired).cloned().collect()
    }

    pub fn get(&self, id: &str) -> Option<Arc<Rule>> {
        self.rules
            .iter()
            .find(|r| r.id == id && !r.retired)
            .cloned()
    }

    /// 与目录求交集，保持调用方顺序；未知 ID 忽略，重复 ID 只保留第一次
    pub fn select(&self, ids: &[String]) -> Vec<Arc<Rule>> {
        let mut seen = HashSet::new();
        ids.iter()
            .filter(|id| seen.insert(id.as_str()))
            .filter_map(|id| self.get(id))
            .collect()
    }

    pub fn rejected(&self) -> &[ResolutionFailure] {
        &self.rejected
    }
}

fn compile_rule(definition: RuleDefinition) -> Result<Rule, ResolutionFailure> {
    let id = definition.id.trim().to_string();
    let fail = |reason: String| ResolutionFailure {
        rule_id: Some(definition.id.clone()),
        reason,
    };

    if id.is_empty() {
        return Err(fail("规则 ID 为空".to_string()));
    }

    let strategy = match definition.strategy {
        StrategyDefinition::Path {
            path,
            pattern,
            min_age_days,
            min_size_mb,
            purge_root,
        } => {
            if path.trim().is_empty() {
                return Err(fail("路径为空".to_string()));
            }
            Strategy::Path {
                path,
                filter: compile_filter(pattern, min_age_days, min_size_mb).map_err(fail)?,
                purge_root,
            }
        }
        StrategyDefinition::Profile {
            relative,
            pattern,
            min_age_days,
            min_size_mb,
        } => {
            validate_relative(&relative).map_err(fail)?;
            Strategy::Profile {
                relative,
                filter: compile_filter(pattern, min_age_days, min_size_mb).map_err(fail)?,
            }
        }
        StrategyDefinition::Drive {
            relative,
            pattern,
            min_age_days,
            min_size_mb,
        } => {
            validate_relative(&relative).map_err(fail)?;
            Strategy::Drive {
                relative,
                filter: compile_filter(pattern, min_age_days, min_size_mb).map_err(fail)?,
            }
        }
        StrategyDefinition::Tool { program, args } => {
            if program.trim().is_empty() {
                return Err(fail("外部工具名称为空".to_string()));
            }
            Strategy::Tool { program, args }
        }
        StrategyDefinition::RegistryOrphans => Strategy::RegistryOrphans,
        StrategyDefinition::AppResidue { min_age_days } => {
            if let Some(days) = min_age_days {
                days_to_duration(days).map_err(fail)?;
            }
            Strategy::AppResidue { min_age_days }
        }
    };

    Ok(Rule {
        id,
        title: definition.title,
        description: definition.description,
        category: definition.category,
        risk: definition.risk,
        default_checked: definition.default_checked,
        requires_admin: definition.requires_admin,
        portable_guard: definition.portable_guard,
        action: definition.action,
        retired: definition.retired,
        sort_order: definition.sort_order,
        strategy,
    })
}

fn compile_filter(
    pattern: Option<String>,
    min_age_days: Option<u64>,
    min_size_mb: Option<u64>,
) -> Result<FileFilter, String> {
    let pattern = match pattern.filter(|p| !p.trim().is_empty()) {
        Some(raw) => Some(
            glob::Pattern::new(&utils::normalize_pattern(&raw))
                .map_err(|e| format!("匹配模式无效 {}: {}", raw, e))?,
        ),
        None => None,
    };

    let min_age = min_age_days.map(days_to_duration).transpose()?;
    let min_size = min_size_mb
        .map(|mb| {
            mb.checked_mul(BYTES_PER_MB)
                .ok_or_else(|| format!("min_size_mb 超出范围: {}", mb))
        })
        .transpose()?;

    Ok(FileFilter {
        pattern,
        min_age,
        min_size,
    })
}

fn days_to_duration(days: u64) -> Result<Duration, String> {
    days.checked_mul(SECS_PER_DAY)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("min_age_days 超出范围: {}", days))
}

/// 相对路径不能是绝对路径，也不能跳出基准目录
fn validate_relative(relative: &str) -> Result<(), String> {
    let trimmed = relative.trim();
    if trimmed.is_empty() {
        return Err("相对路径为空".to_string());
    }
    if trimmed.starts_with(['\\', '/']) || utils::drive_letter(Path::new(trimmed)).is_some() {
        return Err(format!("相对路径不能是绝对路径: {}", relative));
    }

    let normalized = utils::normalize_pattern(trimmed);
    if Path::new(&normalized)
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(format!("相对路径不能包含 '..': {}", relative));
    }

    Ok(())
}
