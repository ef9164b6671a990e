use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, AppResult};

/// 认证用户
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: Value,
}

/// 登录会话
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// 秒级时间戳
    #[serde(default)]
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    pub user: AuthUser,
}

impl AuthSession {
    /// 只有 expires_in 时补全 expires_at
    pub fn with_expiry(mut self, now_secs: i64) -> Self {
        if self.expires_at.is_none() {
            self.expires_at = self.expires_in.map(|secs| now_secs + secs);
        }
        self
    }
}

/// 注册结果；需要邮箱确认时没有会话
#[derive(Debug, Clone, PartialEq)]
pub struct SignUpOutcome {
    pub user: AuthUser,
    pub session: Option<AuthSession>,
}

impl SignUpOutcome {
    pub fn from_value(value: Value, now_secs: i64) -> AppResult<Self> {
        if value.get("access_token").is_some() {
            let session: AuthSession = serde_json::from_value(value)?;
            let session = session.with_expiry(now_secs);
            return Ok(Self {
                user: session.user.clone(),
                session: Some(session),
            });
        }

        let user_value = match value.get("user") {
            Some(user) if !user.is_null() => user.clone(),
            _ => value,
        };
        if user_value.get("id").is_none() {
            return Err(AppError::Backend {
                status: 200,
                message: "sign up response has no user".into(),
            });
        }

        Ok(Self {
            user: serde_json::from_value(user_value)?,
            session: None,
        })
    }
}
