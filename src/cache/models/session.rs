use serde::{Deserialize, Serialize};

use crate::api::models::AuthSession;
use crate::auth::AccountKind;

/// 会话快照，启动时用来跳过远程会话检查
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CachedSession {
    pub kind: AccountKind,
    pub session: AuthSession,
    pub cached_at: i64, // 毫秒时间戳
}

impl CachedSession {
    /// expires_at 为秒级时间戳
    pub fn is_expired(&self, now_millis: i64) -> bool {
        match self.session.expires_at {
            Some(expires_at) => expires_at * 1000 <= now_millis,
            None => false,
        }
    }
}
