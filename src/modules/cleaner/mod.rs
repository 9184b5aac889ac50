//! 清理
//!
//! 清理前重新解析并重新判定阻止状态。目标之间互相独立，
//! 单个目标失败不会中止同一规则的其他目标，也不影响批次中的其他规则。

pub mod filesystem;
pub mod models;
pub mod registry;
pub mod tool;

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::modules::blocker::Availability;
use crate::modules::catalog::models::Rule;
use crate::modules::engine::context::PassContext;
use crate::modules::engine::pool::{self, Abort};
use crate::modules::resolver::models::{ResolvedTarget, TargetLocation};
use crate::modules::scanner::models::Usage;
use models::{CleanItemResult, CleanStatus, Removal, RemovalOutcome};

/// 删除单个目标
pub fn remove_target(target: &ResolvedTarget, cancel: &CancellationToken) -> Removal {
    match &target.location {
        TargetLocation::Path {
            path,
            purge_root,
            action,
        } => filesystem::remove_path(path, &target.filter, *purge_root, *action, cancel),
        TargetLocation::RegistryKey { key } => registry::remove_key(key),
        TargetLocation::Tool { program, args } => tool::run_tool(program, args),
    }
}

/// 清理单条规则
///
/// 阻止状态只在规则开始时判定一次；解析出的目标集合在删除过程中不再扩大。
pub fn clean_rule(rule: &Rule, ctx: &PassContext, cancel: &CancellationToken) -> CleanItemResult {
    if cancel.is_cancelled() {
        return CleanItemResult::new(rule, CleanStatus::Incomplete);
    }

    let (targets, availability) = ctx.evaluate(rule);
    if let Availability::Blocked(reason) = availability {
        return CleanItemResult::new(rule, CleanStatus::Blocked { reason });
    }

    let mut freed = Usage::default();
    let mut by_drive: BTreeMap<String, Usage> = BTreeMap::new();
    let mut outcomes = Vec::with_capacity(targets.len());
    let mut first_failure: Option<String> = None;
    let mut interrupted = false;

    for target in &targets {
        if cancel.is_cancelled() {
            interrupted = true;
            break;
        }

        let removal = ctx.platform().remove(target, cancel);
        freed += removal.freed;
        if let Some(drive) = &target.drive {
            if removal.freed != Usage::default() {
                *by_drive.entry(drive.clone()).or_default() += removal.freed;
            }
        }
        if first_failure.is_none() {
            first_failure = removal.failures.first().cloned();
        }
        outcomes.push(removal.outcome());

        if removal.interrupted {
            interrupted = true;
            break;
        }
    }

    let status = if interrupted {
        CleanStatus::Incomplete
    } else {
        rule_status(&outcomes, first_failure)
    };

    tracing::info!(
        "规则 {} 清理结束: {}, 释放 {} 字节, {} 个文件",
        rule.id,
        status.name(),
        freed.bytes,
        freed.files
    );

    CleanItemResult::new(rule, status).with_freed(freed, by_drive)
}

/// 由各目标结果折叠出规则状态
fn rule_status(outcomes: &[RemovalOutcome], first_failure: Option<String>) -> CleanStatus {
    let message = || first_failure.clone().unwrap_or_default();

    if outcomes.iter().all(|o| *o == RemovalOutcome::Removed) {
        CleanStatus::Ok
    } else if outcomes.iter().all(|o| *o == RemovalOutcome::Failed) {
        CleanStatus::Error { message: message() }
    } else {
        CleanStatus::Partial { message: message() }
    }
}

/// 并发清理选中的规则，结果顺序与输入一致
pub async fn clean_rules(
    rules: Vec<Arc<Rule>>,
    ctx: Arc<PassContext>,
    workers: usize,
    cancel: &CancellationToken,
) -> Vec<CleanItemResult> {
    pool::run_bounded(
        rules,
        workers,
        cancel,
        move |rule, cancel| clean_rule(rule, &ctx, cancel),
        |rule, abort| match abort {
            Abort::Cancelled => CleanItemResult::new(rule, CleanStatus::Incomplete),
            Abort::Failed(message) => {
                tracing::error!("规则 {} 清理异常: {}", rule.id, message);
                CleanItemResult::new(rule, CleanStatus::Error { message })
            }
        },
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_targets_is_ok() {
        assert_eq!(rule_status(&[], None), CleanStatus::Ok);
    }

    #[test]
    fn mixed_outcomes_are_partial() {
        let status = rule_status(
            &[RemovalOutcome::Removed, RemovalOutcome::Failed],
            Some("locked".to_string()),
        );
        assert_eq!(
            status,
            CleanStatus::Partial {
                message: "locked".to_string()
            }
        );

        let status = rule_status(&[RemovalOutcome::PartiallyRemoved], Some("x".to_string()));
        assert_eq!(status.name(), "partial");
    }

    #[test]
    fn all_failed_is_error() {
        let status = rule_status(
            &[RemovalOutcome::Failed, RemovalOutcome::Failed],
            Some("denied".to_string()),
        );
        assert_eq!(
            status,
            CleanStatus::Error {
                message: "denied".to_string()
            }
        );
    }
}
