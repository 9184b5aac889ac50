use serde::Serialize;

use crate::modules::common::error::SweepError;

/// 命令边界错误，调用方整体失败，不会带部分结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandError {
    pub message: String,
}

impl CommandError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(&self.message)
    }
}

impl std::error::Error for CommandError {}

impl From<SweepError> for CommandError {
    fn from(error: SweepError) -> Self {
        Self::new(error.to_string())
    }
}

impl From<tokio::task::JoinError> for CommandError {
    fn from(error: tokio::task::JoinError) -> Self {
        Self::new(format!("后台任务失败: {}", error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_errors_keep_their_message() {
        let error = CommandError::from(SweepError::Settings("设置键不能为空".to_string()));
        assert_eq!(error.message, "设置存储错误: 设置键不能为空");

        let value = serde_json::to_value(&error).expect("json");
        assert_eq!(value["message"], "设置存储错误: 设置键不能为空");
    }
}
