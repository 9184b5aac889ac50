//! 命令边界
//!
//! 展示层只通过 [`Engine`] 的五个入口调用引擎：列出规则、扫描、清理、
//! 读取设置、保存设置。每次调用独立持有自己的结果，引擎内部没有跨调用的可变状态。

pub mod cache;
pub mod context;
pub mod error;
pub mod pool;

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::modules::blocker::EvaluatedRule;
use crate::modules::catalog::Catalog;
use crate::modules::cleaner::{self, models::CleanReport};
use crate::modules::common::config::EngineConfig;
use crate::modules::platform::{Platform, SystemPlatform};
use crate::modules::reporter::{self, models::ReportDocument, SavedReport};
use crate::modules::scanner::{self, models::ScanResult};
use crate::modules::settings::SettingsStore;
pub use cache::ScanCache;
use context::PassContext;
pub use error::CommandError;

#[derive(Clone)]
pub struct Engine {
    catalog: Arc<Catalog>,
    platform: Arc<dyn Platform>,
    config: EngineConfig,
    settings: SettingsStore,
}

impl Engine {
    /// 使用真实平台与配置中的规则目录
    pub fn new(config: EngineConfig) -> Result<Self, CommandError> {
        let catalog = Catalog::load(&config)?;
        Ok(Self::with_parts(
            catalog,
            Arc::new(SystemPlatform::new()),
            config,
        ))
    }

    pub fn with_parts(catalog: Catalog, platform: Arc<dyn Platform>, config: EngineConfig) -> Self {
        let settings = SettingsStore::new(config.settings_db_path());
        Self {
            catalog: Arc::new(catalog),
            platform,
            config,
            settings,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 采集本轮上下文
    async fn capture_context(&self) -> Result<Arc<PassContext>, CommandError> {
        let platform = self.platform.clone();
        let residue_age_days = self.config.residue_age_days;
        let ctx =
            tokio::task::spawn_blocking(move || PassContext::capture(platform, residue_age_days))
                .await?;
        Ok(Arc::new(ctx))
    }

    /// 列出规则及其当前阻止状态
    pub async fn list_rules(&self) -> Result<Vec<EvaluatedRule>, CommandError> {
        let ctx = self.capture_context().await?;
        let rules = self.catalog.rules();

        let evaluated = tokio::task::spawn_blocking(move || {
            rules
                .iter()
                .map(|rule| {
                    let (_, availability) = ctx.evaluate(rule);
                    EvaluatedRule {
                        rule: (**rule).clone(),
                        availability,
                    }
                })
                .collect::<Vec<_>>()
        })
        .await?;

        tracing::info!("列出 {} 条规则", evaluated.len());
        Ok(evaluated)
    }

    pub async fn scan_rules(&self) -> Result<Vec<ScanResult>, CommandError> {
        self.scan_rules_with(CancellationToken::new()).await
    }

    /// 扫描全部规则，取消后未完成的规则标记为 incomplete
    pub async fn scan_rules_with(
        &self,
        cancel: CancellationToken,
    ) -> Result<Vec<ScanResult>, CommandError> {
        let ctx = self.capture_context().await?;
        let rules = self.catalog.rules();
        tracing::info!("开始扫描 {} 条规则", rules.len());

        let results = scanner::scan_rules(rules, ctx, self.config.workers, &cancel).await;

        let total: u64 = results.iter().map(|r| r.total_bytes).sum();
        tracing::info!("扫描完成: 共 {} 字节可回收", total);
        Ok(results)
    }

    pub async fn clean_rules(&self, ids: &[String]) -> Result<CleanReport, CommandError> {
        self.clean_rules_with(ids, CancellationToken::new()).await
    }

    /// 清理选中的规则；未知 ID 忽略，结果顺序与请求一致
    pub async fn clean_rules_with(
        &self,
        ids: &[String],
        cancel: CancellationToken,
    ) -> Result<CleanReport, CommandError> {
        let rules = self.catalog.select(ids);
        if rules.len() < ids.len() {
            tracing::debug!("忽略 {} 个未知或重复的规则 ID", ids.len() - rules.len());
        }

        let items = if rules.is_empty() {
            Vec::new()
        } else {
            let ctx = self.capture_context().await?;
            tracing::info!("开始清理 {} 条规则", rules.len());
            cleaner::clean_rules(rules, ctx, self.config.workers, &cancel).await
        };

        let summary = reporter::aggregate(&items);
        tracing::info!(
            "清理完成: 释放 {} 字节, {} 个文件",
            summary.total_bytes,
            summary.total_files
        );
        Ok(CleanReport { items, summary })
    }

    pub async fn get_setting(&self, key: &str) -> Result<Option<String>, CommandError> {
        let settings = self.settings.clone();
        let key = key.to_string();
        let value = tokio::task::spawn_blocking(move || settings.get(&key)).await??;
        Ok(value)
    }

    pub async fn set_setting(&self, key: &str, value: &str) -> Result<(), CommandError> {
        let settings = self.settings.clone();
        let (key, value) = (key.to_string(), value.to_string());
        tokio::task::spawn_blocking(move || settings.set(&key, &value)).await??;
        Ok(())
    }

    /// 保存清理报告，未指定路径时写入数据目录下的 reports
    pub fn save_report(
        &self,
        report: CleanReport,
        path: Option<&Path>,
    ) -> Result<SavedReport, CommandError> {
        let document = ReportDocument::new(report);
        let base = match path {
            Some(path) => path.to_path_buf(),
            None => reporter::default_report_base(&self.config.reports_dir(), &document),
        };
        Ok(reporter::save_report(&document, &base)?)
    }
}
