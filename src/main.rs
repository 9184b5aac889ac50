use anyhow::Result;
use clap::Parser;
use std::process;

use winsweep_lib::commands;
use winsweep_lib::modules::common::config::EngineConfig;
use winsweep_lib::modules::common::logging;
use winsweep_lib::Engine;

#[derive(Parser, Debug)]
#[command(name = "winsweep")]
#[command(about = "Windows 磁盘清理命令行工具", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: commands::Command,

    /// 详细输出模式
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 初始化日志
    logging::init_logging(cli.verbose);

    if let Err(e) = run(cli.command).await {
        if cli.verbose {
            tracing::error!("错误: {:#}", e);
        } else {
            eprintln!("错误: {:#}", e);
        }
        process::exit(1);
    }

    Ok(())
}

async fn run(command: commands::Command) -> Result<()> {
    let config = EngineConfig::load()?;
    let engine = Engine::new(config)?;

    match command {
        commands::Command::List(cmd) => commands::list::execute(cmd, &engine).await,
        commands::Command::Scan(cmd) => commands::scan::execute(cmd, &engine).await,
        commands::Command::Clean(cmd) => commands::clean::execute(cmd, &engine).await,
        commands::Command::Setting(cmd) => commands::setting::execute(cmd, &engine).await,
    }
}
