use anyhow::Result;
use clap::Parser;

use crate::modules::blocker::EvaluatedRule;
use crate::modules::common::utils::truncate_string;
use crate::modules::engine::Engine;

#[derive(Parser, Debug)]
pub struct ListCommand {
    /// 输出格式 (table/json)
    #[arg(long, default_value = "table")]
    pub format: String,
}

pub async fn execute(cmd: ListCommand, engine: &Engine) -> Result<()> {
    let rules = engine.list_rules().await?;

    match cmd.format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&rules)?);
        }
        _ => {
            print_table(&rules);
        }
    }

    Ok(())
}

fn print_table(rules: &[EvaluatedRule]) {
    println!("\n{}", "=".repeat(100));
    println!(
        "{:<24} {:<10} {:<8} {:<6} {:<50}",
        "规则", "分类", "风险", "默认", "状态"
    );
    println!("{}", "=".repeat(100));

    for evaluated in rules {
        let rule = &evaluated.rule;
        let state = match evaluated.availability.reason() {
            Some(reason) => format!("已阻止: {}", reason),
            None => "可用".to_string(),
        };

        println!(
            "{:<24} {:<10} {:<8} {:<6} {:<50}",
            truncate_string(&rule.id, 23),
            rule.category,
            rule.risk,
            if rule.default_checked { "是" } else { "" },
            truncate_string(&state, 50)
        );
    }

    let blocked = rules.iter().filter(|r| r.availability.is_blocked()).count();
    println!("{}", "=".repeat(100));
    println!("总计: {} 条规则, {} 条被阻止\n", rules.len(), blocked);
}
