use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::modules::engine::Engine;

#[derive(Parser, Debug)]
pub struct SettingCommand {
    #[command(subcommand)]
    pub action: SettingAction,
}

#[derive(Subcommand, Debug)]
pub enum SettingAction {
    /// 读取设置
    Get { key: String },

    /// 保存设置
    Set { key: String, value: String },
}

pub async fn execute(cmd: SettingCommand, engine: &Engine) -> Result<()> {
    match cmd.action {
        SettingAction::Get { key } => match engine.get_setting(&key).await? {
            Some(value) => println!("{}", value),
            None => {
                tracing::debug!("设置不存在: {}", key);
            }
        },
        SettingAction::Set { key, value } => {
            engine.set_setting(&key, &value).await?;
            println!("已保存: {} = {}", key, value);
        }
    }

    Ok(())
}
