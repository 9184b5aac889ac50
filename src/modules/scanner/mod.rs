//! 扫描
//!
//! 统计每条规则可回收的空间。扫描只读，单个目标失败不影响规则，
//! 规则之间互不依赖。

pub mod filesystem;
pub mod models;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::modules::blocker::Availability;
use crate::modules::catalog::models::Rule;
use crate::modules::engine::context::PassContext;
use crate::modules::engine::pool::{self, Abort};
use crate::modules::resolver::models::{ResolvedTarget, TargetLocation};
use models::{ScanResult, ScanStatus, TargetFailure, Usage};

/// 统计单个目标
pub fn measure_target(
    target: &ResolvedTarget,
    cancel: &CancellationToken,
) -> Result<Usage, TargetFailure> {
    match &target.location {
        TargetLocation::Path { path, .. } => filesystem::measure_path(path, &target.filter, cancel),
        // 注册表项按条目计数
        TargetLocation::RegistryKey { .. } => Ok(Usage::new(0, 1)),
        TargetLocation::Tool { .. } => Ok(Usage::default()),
    }
}

/// 扫描单条规则
pub fn scan_rule(rule: &Rule, ctx: &PassContext, cancel: &CancellationToken) -> ScanResult {
    if cancel.is_cancelled() {
        return ScanResult::incomplete(&rule.id, Usage::default());
    }

    let (targets, availability) = ctx.evaluate(rule);
    if let Availability::Blocked(reason) = availability {
        return ScanResult::blocked(&rule.id, reason);
    }

    let mut total = Usage::default();
    let mut failures: Vec<TargetFailure> = Vec::new();

    for target in &targets {
        if cancel.is_cancelled() {
            return ScanResult::incomplete(&rule.id, total);
        }
        match ctx.platform().measure(target, cancel) {
            Ok(usage) => total += usage,
            Err(failure) => {
                tracing::warn!("规则 {} 的目标无法统计: {}", rule.id, failure);
                failures.push(failure);
            }
        }
    }

    if cancel.is_cancelled() {
        return ScanResult::incomplete(&rule.id, total);
    }

    let status = match failures.first() {
        Some(first) if failures.len() == targets.len() => ScanStatus::Error {
            message: first.to_string(),
        },
        _ => ScanStatus::Ok,
    };

    tracing::debug!(
        "规则 {} 扫描完成: {} 个目标, {} 字节, {} 个文件",
        rule.id,
        targets.len(),
        total.bytes,
        total.files
    );

    ScanResult {
        id: rule.id.clone(),
        status,
        total_bytes: total.bytes,
        total_files: total.files,
    }
}

/// 并发扫描一组规则，结果顺序与输入一致
pub async fn scan_rules(
    rules: Vec<Arc<Rule>>,
    ctx: Arc<PassContext>,
    workers: usize,
    cancel: &CancellationToken,
) -> Vec<ScanResult> {
    pool::run_bounded(
        rules,
        workers,
        cancel,
        move |rule, cancel| scan_rule(rule, &ctx, cancel),
        |rule, abort| match abort {
            Abort::Cancelled => ScanResult::incomplete(&rule.id, Usage::default()),
            Abort::Failed(message) => {
                tracing::error!("规则 {} 扫描异常: {}", rule.id, message);
                ScanResult {
                    id: rule.id.clone(),
                    status: ScanStatus::Error { message },
                    total_bytes: 0,
                    total_files: 0,
                }
            }
        },
    )
    .await
}
