use std::sync::Arc;

use crate::modules::blocker::{self, Availability};
use crate::modules::catalog::models::Rule;
use crate::modules::platform::{Platform, ProcessSnapshot};
use crate::modules::resolver::models::ResolvedTarget;
use crate::modules::resolver::Resolver;

/// 单次扫描/清理共享的机器状态快照
///
/// 每轮重新采集，不跨轮复用。
pub struct PassContext {
    resolver: Resolver,
    elevated: bool,
    processes: ProcessSnapshot,
}

impl PassContext {
    /// 采集权限与进程信息（阻塞调用）
    pub fn capture(platform: Arc<dyn Platform>, residue_age_days: u64) -> Self {
        let elevated = platform.is_elevated();
        let processes = platform.process_snapshot();
        tracing::debug!("本轮上下文: 管理员={}, 进程快照为空={}", elevated, processes.is_empty());

        Self {
            resolver: Resolver::new(platform, residue_age_days),
            elevated,
            processes,
        }
    }

    pub fn platform(&self) -> &dyn Platform {
        self.resolver.platform()
    }

    /// 解析规则并判定是否被阻止
    pub fn evaluate(&self, rule: &Rule) -> (Vec<ResolvedTarget>, Availability) {
        let targets = self.resolver.resolve(rule);
        let reason = blocker::classify(rule, &targets, self.elevated, &self.processes);
        if let Some(reason) = &reason {
            tracing::info!("规则 {} 被阻止: {}", rule.id, reason);
        }
        (targets, Availability::from(reason))
    }
}
