use thiserror::Error;

#[derive(Error, Debug)]
pub enum SweepError {
    #[error("规则目录错误: {0}")]
    Catalog(String),

    #[error("注册表错误: {0}")]
    Registry(String),

    #[error("文件系统错误: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("设置存储错误: {0}")]
    Settings(String),

    #[error("权限不足: {0}")]
    PermissionDenied(String),

    #[error("当前平台不支持: {0}")]
    Unsupported(String),

    #[error("配置错误: {0}")]
    Config(String),

    #[error("序列化错误: {0}")]
    Serde(String),
}

impl From<rusqlite::Error> for SweepError {
    fn from(error: rusqlite::Error) -> Self {
        SweepError::Settings(error.to_string())
    }
}

impl From<serde_json::Error> for SweepError {
    fn from(error: serde_json::Error) -> Self {
        SweepError::Serde(error.to_string())
    }
}

impl serde::Serialize for SweepError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
