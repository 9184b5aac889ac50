pub mod clean;
pub mod list;
pub mod scan;
pub mod setting;

use std::time::Duration;

use clap::Subcommand;
use tokio_util::sync::CancellationToken;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 列出所有清理规则
    List(list::ListCommand),

    /// 扫描可回收空间
    Scan(scan::ScanCommand),

    /// 清理选中的规则
    Clean(clean::CleanCommand),

    /// 读取或保存设置
    Setting(setting::SettingCommand),
}

/// Ctrl-C 或超时后取消
pub fn cancellation(timeout: Option<u64>) -> CancellationToken {
    let token = CancellationToken::new();

    let on_signal = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\n正在取消...");
            on_signal.cancel();
        }
    });

    if let Some(secs) = timeout {
        let on_timeout = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            tracing::warn!("超过 {} 秒, 取消剩余工作", secs);
            on_timeout.cancel();
        });
    }

    token
}
