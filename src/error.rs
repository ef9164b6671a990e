use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("存储错误: {0}")]
    Storage(#[from] redis::RedisError),

    #[error("网络请求失败: {0}")]
    Http(#[from] reqwest::Error),

    #[error("请求失败: {0}")]
    Transport(String),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("配置缺失: {0}")]
    Config(#[from] std::env::VarError),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("后端返回错误 {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("未登录")]
    NotAuthenticated,

    #[error("定位失败: {0}")]
    Location(String),

    #[error("图片加载失败: {0}")]
    Image(String),
}

impl AppError {
    /// 后端返回的 401/403 视为会话失效
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AppError::Backend { status: 401 | 403, .. } | AppError::NotAuthenticated)
    }
}

pub type AppResult<T> = Result<T, AppError>;
