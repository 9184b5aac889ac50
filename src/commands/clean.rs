use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use super::cancellation;
use crate::modules::catalog::models::Risk;
use crate::modules::cleaner::models::CleanReport;
use crate::modules::common::utils::{format_size, truncate_string};
use crate::modules::engine::{Engine, ScanCache};

#[derive(Parser, Debug)]
pub struct CleanCommand {
    /// 要清理的规则 ID
    #[arg(required = true)]
    pub ids: Vec<String>,

    /// 确认删除 (不指定则预览)
    #[arg(long)]
    pub confirm: bool,

    /// 生成报告
    #[arg(long)]
    pub report: bool,

    /// 报告输出路径 (不含扩展名时同时写入 .json 与 .html)
    #[arg(long)]
    pub report_path: Option<PathBuf>,

    /// 超时秒数
    #[arg(long, env = "WINSWEEP_TIMEOUT")]
    pub timeout: Option<u64>,

    /// 输出格式 (table/json)
    #[arg(long, default_value = "table")]
    pub format: String,
}

pub async fn execute(cmd: CleanCommand, engine: &Engine) -> Result<()> {
    let cancel = cancellation(cmd.timeout);

    // 1. 先扫描，得到每条规则最近一次已知的大小
    // 进度信息写 stderr，stdout 只输出结果
    eprintln!("正在扫描...");
    let mut cache = ScanCache::new();
    cache.record(&engine.scan_rules_with(cancel.clone()).await?);

    let selected = engine.catalog().select(&cmd.ids);
    if selected.is_empty() {
        println!("没有匹配的规则: {}", cmd.ids.join(", "));
    }

    // 2. 预览模式 (不确认)
    if !cmd.confirm {
        println!("=== 预览模式 ===");
        println!("使用 --confirm 确认删除\n");

        for rule in &selected {
            let size = cache
                .last_known_bytes(&rule.id)
                .map(format_size)
                .unwrap_or_else(|| "-".to_string());
            let status = cache.get(&rule.id).map(|r| r.status_name()).unwrap_or("-");
            println!(
                "  {:<24} {:<10} {:>14}  {}",
                truncate_string(&rule.id, 23),
                rule.category,
                size,
                status
            );
        }

        if selected.iter().any(|r| r.risk == Risk::High) {
            println!("\n注意: 选中的规则包含高风险项，请确认后再执行");
        }
        println!("\n共 {} 项", selected.len());
        return Ok(());
    }

    // 3. 执行删除
    eprintln!("=== 开始清理 ===\n");
    let report = engine.clean_rules_with(&cmd.ids, cancel).await?;

    print!("{}", render_report(&report, &cache, &cmd.format)?);
    cache.invalidate(&report);

    // 4. 生成报告
    if cmd.report || cmd.report_path.is_some() {
        let saved = engine.save_report(report, cmd.report_path.as_deref())?;
        eprintln!("\n报告已生成: {}", saved.html.display());
        eprintln!("           {}", saved.json.display());
    }

    Ok(())
}

/// 渲染清理结果 (table/json)
fn render_report(report: &CleanReport, cache: &ScanCache, format: &str) -> Result<String> {
    match format {
        "json" => Ok(format!("{}\n", serde_json::to_string_pretty(report)?)),
        _ => Ok(render_table(report, cache)?),
    }
}

fn render_table(report: &CleanReport, cache: &ScanCache) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    writeln!(
        out,
        "{:<24} {:<12} {:>14} {:>14} {:>8}  {}",
        "规则", "状态", "预计", "已释放", "文件数", "说明"
    )?;

    for item in &report.items {
        let estimated = cache
            .last_known_bytes(&item.id)
            .map(format_size)
            .unwrap_or_else(|| "-".to_string());
        writeln!(
            out,
            "{:<24} {:<12} {:>14} {:>14} {:>8}  {}",
            truncate_string(&item.id, 23),
            item.status.name(),
            estimated,
            format_size(item.total_bytes),
            item.total_files,
            truncate_string(&item.status.message().unwrap_or_default(), 40)
        )?;
    }

    let summary = &report.summary;
    writeln!(out, "\n--- 清理完成 ---")?;
    writeln!(out, "  释放空间: {}", format_size(summary.total_bytes))?;
    writeln!(out, "  删除文件: {}", summary.total_files)?;

    for (title, buckets) in [("按分类", &summary.by_category), ("按磁盘", &summary.by_drive)] {
        if buckets.is_empty() {
            continue;
        }
        writeln!(out, "\n  {}:", title)?;
        for bucket in buckets {
            writeln!(
                out,
                "    {:<12} {:>14} {:>6.1}%",
                bucket.key,
                format_size(bucket.bytes),
                bucket.percent
            )?;
        }
    }

    Ok(out)
}
