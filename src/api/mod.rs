/// 后端服务（BaaS）接口
/// 认证、资料读写、插入数据与场馆列表
pub mod client;
pub mod models;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::AppResult;
use crate::venue::Venue;
use models::{AuthSession, AuthUser, Profile, SignUpOutcome};

pub use client::SupabaseClient;

#[async_trait]
pub trait Backend: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str, metadata: Value)
    -> AppResult<SignUpOutcome>;

    async fn sign_in(&self, email: &str, password: &str) -> AppResult<AuthSession>;

    async fn sign_out(&self, access_token: &str) -> AppResult<()>;

    /// 校验令牌并返回对应用户，令牌无效时返回 401 错误
    async fn get_user(&self, access_token: &str) -> AppResult<AuthUser>;

    async fn fetch_profile(
        &self,
        table: &str,
        id: &str,
        access_token: Option<&str>,
    ) -> AppResult<Option<Profile>>;

    async fn update_profile(
        &self,
        table: &str,
        id: &str,
        changes: &Value,
        access_token: Option<&str>,
    ) -> AppResult<Profile>;

    async fn insert_row(
        &self,
        table: &str,
        row: &Value,
        access_token: Option<&str>,
    ) -> AppResult<Value>;

    async fn list_venues(&self, access_token: Option<&str>) -> AppResult<Vec<Venue>>;
}

#[cfg(test)]
pub mod fake {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;
    use crate::error::AppError;

    /// 内存后端：一个账号表和若干数据表
    #[derive(Default)]
    pub struct FakeBackend {
        accounts: Mutex<HashMap<String, (String, AuthUser)>>,
        revoked: Mutex<Vec<String>>,
        pub rows: Mutex<HashMap<String, Vec<Value>>>,
        pub venues: Mutex<Vec<Venue>>,
        pub fail_sign_out: AtomicBool,
        pub get_user_calls: AtomicUsize,
        pub expires_at: Mutex<Option<i64>>,
    }

    impl FakeBackend {
        pub fn token_for(user_id: &str) -> String {
            format!("token-{}", user_id)
        }

        pub fn revoke(&self, token: &str) {
            self.revoked.lock().unwrap().push(token.to_string());
        }

        fn session_for(&self, user: &AuthUser) -> AuthSession {
            AuthSession {
                access_token: Self::token_for(&user.id),
                refresh_token: Some("refresh".into()),
                expires_at: *self.expires_at.lock().unwrap(),
                expires_in: None,
                user: user.clone(),
            }
        }

        fn unauthorized() -> AppError {
            AppError::Backend {
                status: 401,
                message: "invalid JWT".into(),
            }
        }
    }

    #[async_trait]
    impl Backend for FakeBackend {
        async fn sign_up(
            &self,
            email: &str,
            password: &str,
            metadata: Value,
        ) -> AppResult<SignUpOutcome> {
            let mut accounts = self.accounts.lock().unwrap();
            if accounts.contains_key(email) {
                return Err(AppError::Backend {
                    status: 422,
                    message: "User already registered".into(),
                });
            }
            let user = AuthUser {
                id: format!("user-{}", accounts.len() + 1),
                email: Some(email.to_string()),
                user_metadata: metadata,
            };
            accounts.insert(email.to_string(), (password.to_string(), user.clone()));
            Ok(SignUpOutcome {
                session: Some(self.session_for(&user)),
                user,
            })
        }

        async fn sign_in(&self, email: &str, password: &str) -> AppResult<AuthSession> {
            let accounts = self.accounts.lock().unwrap();
            match accounts.get(email) {
                Some((stored, user)) if stored == password => Ok(self.session_for(user)),
                _ => Err(AppError::Backend {
                    status: 400,
                    message: "Invalid login credentials".into(),
                }),
            }
        }

        async fn sign_out(&self, access_token: &str) -> AppResult<()> {
            if self.fail_sign_out.load(Ordering::SeqCst) {
                return Err(AppError::Transport("connection reset".into()));
            }
            self.revoke(access_token);
            Ok(())
        }

        async fn get_user(&self, access_token: &str) -> AppResult<AuthUser> {
            self.get_user_calls.fetch_add(1, Ordering::SeqCst);
            if self.revoked.lock().unwrap().iter().any(|t| t == access_token) {
                return Err(Self::unauthorized());
            }
            self.accounts
                .lock()
                .unwrap()
                .values()
                .find(|(_, user)| Self::token_for(&user.id) == access_token)
                .map(|(_, user)| user.clone())
                .ok_or_else(Self::unauthorized)
        }

        async fn fetch_profile(
            &self,
            table: &str,
            id: &str,
            _access_token: Option<&str>,
        ) -> AppResult<Option<Profile>> {
            let rows = self.rows.lock().unwrap();
            let row = rows
                .get(table)
                .and_then(|rows| rows.iter().find(|r| r["id"] == json!(id)).cloned());
            Ok(row.map(serde_json::from_value).transpose()?)
        }

        async fn update_profile(
            &self,
            table: &str,
            id: &str,
            changes: &Value,
            _access_token: Option<&str>,
        ) -> AppResult<Profile> {
            let mut rows = self.rows.lock().unwrap();
            let row = rows
                .get_mut(table)
                .and_then(|rows| rows.iter_mut().find(|r| r["id"] == json!(id)))
                .ok_or(AppError::Backend {
                    status: 406,
                    message: "no rows returned".into(),
                })?;
            if let (Some(row), Some(changes)) = (row.as_object_mut(), changes.as_object()) {
                for (k, v) in changes {
                    row.insert(k.clone(), v.clone());
                }
            }
            Ok(serde_json::from_value(row.clone())?)
        }

        async fn insert_row(
            &self,
            table: &str,
            row: &Value,
            _access_token: Option<&str>,
        ) -> AppResult<Value> {
            self.rows
                .lock()
                .unwrap()
                .entry(table.to_string())
                .or_default()
                .push(row.clone());
            Ok(row.clone())
        }

        async fn list_venues(&self, _access_token: Option<&str>) -> AppResult<Vec<Venue>> {
            Ok(self.venues.lock().unwrap().clone())
        }
    }
}
