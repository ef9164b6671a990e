// 通用的数据结构定义

use serde::Deserialize;

/// 后端错误响应，认证接口与数据表接口的字段不一致
#[derive(Debug, Default, Deserialize)]
pub struct BackendErrorBody {
    /// 错误码，数据表接口为字符串，认证接口为数字
    #[serde(default)]
    pub code: Option<serde_json::Value>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// 从错误响应中取出可读的错误信息
pub fn error_message(body: &str) -> String {
    let parsed = serde_json::from_str::<BackendErrorBody>(body).unwrap_or_default();
    parsed
        .error_description
        .or(parsed.msg)
        .or(parsed.message)
        .or(parsed.error)
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "empty response".to_string()
            } else {
                trimmed.to_string()
            }
        })
}
