use anyhow::Result;
use clap::Parser;

use super::cancellation;
use crate::modules::common::utils::{format_size, truncate_string};
use crate::modules::engine::Engine;
use crate::modules::scanner::models::{ScanResult, ScanStatus};

#[derive(Parser, Debug)]
pub struct ScanCommand {
    /// 输出格式 (table/json)
    #[arg(long, default_value = "table")]
    pub format: String,

    /// 超时秒数，超时后未完成的规则标记为未完成
    #[arg(long, env = "WINSWEEP_TIMEOUT")]
    pub timeout: Option<u64>,
}

pub async fn execute(cmd: ScanCommand, engine: &Engine) -> Result<()> {
    let cancel = cancellation(cmd.timeout);
    let results = engine.scan_rules_with(cancel).await?;

    match cmd.format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        _ => {
            print_table(&results);
        }
    }

    Ok(())
}

fn print_table(results: &[ScanResult]) {
    println!("\n{}", "=".repeat(90));
    println!("{:<24} {:<12} {:>14} {:>10}  {}", "规则", "状态", "大小", "文件数", "说明");
    println!("{}", "=".repeat(90));

    for result in results {
        let note = match &result.status {
            ScanStatus::Blocked { reason } => reason.to_string(),
            ScanStatus::Error { message } => message.clone(),
            ScanStatus::Ok | ScanStatus::Incomplete => String::new(),
        };

        println!(
            "{:<24} {:<12} {:>14} {:>10}  {}",
            truncate_string(&result.id, 23),
            result.status_name(),
            format_size(result.total_bytes),
            result.total_files,
            truncate_string(&note, 40)
        );
    }

    let total: u64 = results.iter().map(|r| r.total_bytes).sum();
    println!("{}", "=".repeat(90));
    println!("可回收: {}\n", format_size(total));
}
