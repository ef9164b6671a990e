use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::RwLock;

use crate::api::Backend;
use crate::api::models::{AuthSession, Profile};
use crate::cache::keys::{CLIENT_SESSION_KEY, USER_LOCATION_CACHE_KEY, USER_SESSION_KEY};
use crate::cache::{CachedSession, KeyValueStore, read_json, write_json};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::utils::{Clock, SystemClock};

/// 账号类型：球员或场馆方
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Player,
    Client,
}

impl AccountKind {
    pub fn session_key(&self) -> &'static str {
        match self {
            AccountKind::Player => USER_SESSION_KEY,
            AccountKind::Client => CLIENT_SESSION_KEY,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Player => "player",
            AccountKind::Client => "client",
        }
    }
}

/// 会话上下文，显式传给需要当前登录状态的地方
pub struct SessionManager {
    store: Arc<dyn KeyValueStore>,
    backend: Arc<dyn Backend>,
    clock: Arc<dyn Clock>,
    profile_tables: HashMap<AccountKind, String>,
    current: RwLock<HashMap<AccountKind, AuthSession>>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn KeyValueStore>, backend: Arc<dyn Backend>, config: &Config) -> Self {
        Self::with_clock(store, backend, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<dyn KeyValueStore>,
        backend: Arc<dyn Backend>,
        config: &Config,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let profile_tables = HashMap::from([
            (AccountKind::Player, config.player_profile_table.clone()),
            (AccountKind::Client, config.client_profile_table.clone()),
        ]);
        Self {
            store,
            backend,
            clock,
            profile_tables,
            current: RwLock::new(HashMap::new()),
        }
    }

    fn profile_table(&self, kind: AccountKind) -> &str {
        self.profile_tables
            .get(&kind)
            .map(String::as_str)
            .unwrap_or("profiles")
    }

    /// 启动时恢复会话：缓存未过期直接使用，否则向后端校验
    pub async fn restore(&self, kind: AccountKind) -> Option<AuthSession> {
        let cached = match read_json::<CachedSession>(self.store.as_ref(), kind.session_key()).await
        {
            Ok(cached) => cached?,
            Err(e) => {
                tracing::warn!("Failed to read {} session cache: {}", kind.as_str(), e);
                return None;
            }
        };

        if cached.kind != kind {
            tracing::warn!("Session cache for {} holds a {} session", kind.as_str(), cached.kind.as_str());
            self.forget(kind).await;
            return None;
        }

        if !cached.is_expired(self.clock.now_millis()) {
            tracing::debug!("Restored {} session from cache", kind.as_str());
            self.current.write().await.insert(kind, cached.session.clone());
            return Some(cached.session);
        }

        match self.backend.get_user(&cached.session.access_token).await {
            Ok(user) => {
                let mut session = cached.session;
                session.user = user;
                self.remember(kind, &session).await;
                Some(session)
            }
            Err(e) if e.is_unauthorized() => {
                tracing::info!("Cached {} session rejected, signing out locally", kind.as_str());
                self.forget(kind).await;
                None
            }
            Err(e) => {
                tracing::warn!("Failed to verify {} session: {}", kind.as_str(), e);
                None
            }
        }
    }

    /// 注册并创建资料行；需要邮箱确认时返回 None
    pub async fn sign_up(
        &self,
        kind: AccountKind,
        email: &str,
        password: &str,
        full_name: &str,
        phone: Option<&str>,
    ) -> AppResult<Option<AuthSession>> {
        let metadata = json!({ "full_name": full_name, "account_type": kind.as_str() });
        let outcome = self.backend.sign_up(email, password, metadata).await?;

        let mut row = json!({
            "id": outcome.user.id,
            "email": email,
            "full_name": full_name,
        });
        if let Some(phone) = phone {
            row["phone"] = json!(phone);
        }
        let token = outcome.session.as_ref().map(|s| s.access_token.as_str());
        self.backend
            .insert_row(self.profile_table(kind), &row, token)
            .await?;

        if let Some(session) = &outcome.session {
            self.remember(kind, session).await;
        }
        tracing::info!("Signed up {} {}", kind.as_str(), outcome.user.id);
        Ok(outcome.session)
    }

    pub async fn sign_in(
        &self,
        kind: AccountKind,
        email: &str,
        password: &str,
    ) -> AppResult<AuthSession> {
        let session = self.backend.sign_in(email, password).await?;
        self.remember(kind, &session).await;
        tracing::info!("Signed in {} {}", kind.as_str(), session.user.id);
        Ok(session)
    }

    /// 远程退出失败只记日志，本地会话与位置缓存总是清除
    pub async fn sign_out(&self, kind: AccountKind) {
        let session = self.current.read().await.get(&kind).cloned();
        if let Some(session) = session {
            if let Err(e) = self.backend.sign_out(&session.access_token).await {
                tracing::warn!("Remote sign out failed for {}: {}", kind.as_str(), e);
            }
        }

        self.forget(kind).await;
        if let Err(e) = self.store.remove(USER_LOCATION_CACHE_KEY).await {
            tracing::warn!("Failed to clear location cache on sign out: {}", e);
        }
    }

    pub async fn current(&self, kind: AccountKind) -> Option<AuthSession> {
        self.current.read().await.get(&kind).cloned()
    }

    pub async fn access_token(&self, kind: AccountKind) -> Option<String> {
        self.current(kind).await.map(|s| s.access_token)
    }

    pub async fn profile(&self, kind: AccountKind) -> AppResult<Option<Profile>> {
        let session = self.current(kind).await.ok_or(AppError::NotAuthenticated)?;
        self.backend
            .fetch_profile(
                self.profile_table(kind),
                &session.user.id,
                Some(&session.access_token),
            )
            .await
    }

    /// changes 为要更新的字段；id 不允许修改
    pub async fn update_profile(&self, kind: AccountKind, changes: Value) -> AppResult<Profile> {
        let session = self.current(kind).await.ok_or(AppError::NotAuthenticated)?;
        let mut changes = changes;
        if let Some(map) = changes.as_object_mut() {
            map.remove("id");
        }
        self.backend
            .update_profile(
                self.profile_table(kind),
                &session.user.id,
                &changes,
                Some(&session.access_token),
            )
            .await
    }

    async fn remember(&self, kind: AccountKind, session: &AuthSession) {
        self.current.write().await.insert(kind, session.clone());
        let cached = CachedSession {
            kind,
            session: session.clone(),
            cached_at: self.clock.now_millis(),
        };
        if let Err(e) = write_json(self.store.as_ref(), kind.session_key(), &cached).await {
            tracing::warn!("Failed to cache {} session: {}", kind.as_str(), e);
        }
    }

    async fn forget(&self, kind: AccountKind) {
        self.current.write().await.remove(&kind);
        if let Err(e) = self.store.remove(kind.session_key()).await {
            tracing::warn!("Failed to remove {} session cache: {}", kind.as_str(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::api::fake::FakeBackend;
    use crate::cache::MemoryStore;
    use crate::utils::ManualClock;

    const NOW_MS: i64 = 1_700_000_000_000;

    struct Fixture {
        store: Arc<MemoryStore>,
        backend: Arc<FakeBackend>,
        clock: Arc<ManualClock>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                store: Arc::new(MemoryStore::new()),
                backend: Arc::new(FakeBackend::default()),
                clock: Arc::new(ManualClock::at(NOW_MS)),
            }
        }

        // 模拟应用重启：新的上下文，同一个存储
        fn manager(&self) -> SessionManager {
            SessionManager::with_clock(
                self.store.clone(),
                self.backend.clone(),
                &Config::for_tests(),
                self.clock.clone(),
            )
        }
    }

    #[tokio::test]
    async fn sign_up_creates_profile_and_caches_session() {
        let f = Fixture::new();
        let sessions = f.manager();

        let session = sessions
            .sign_up(AccountKind::Player, "asha@example.com", "pw", "Asha", Some("98450"))
            .await
            .unwrap()
            .unwrap();

        let profile = sessions.profile(AccountKind::Player).await.unwrap().unwrap();
        assert_eq!(profile.id, session.user.id);
        assert_eq!(profile.full_name.as_deref(), Some("Asha"));
        assert_eq!(profile.phone.as_deref(), Some("98450"));
        assert!(f.store.get(USER_SESSION_KEY).await.unwrap().is_some());
        assert!(sessions.current(AccountKind::Client).await.is_none());
    }

    #[tokio::test]
    async fn client_profiles_use_their_own_table() {
        let f = Fixture::new();
        let sessions = f.manager();
        sessions
            .sign_up(AccountKind::Client, "owner@arena.in", "pw", "Arena Owner", None)
            .await
            .unwrap();

        let rows = f.backend.rows.lock().unwrap();
        assert_eq!(rows.get("clients").map(Vec::len), Some(1));
        assert!(rows.get("profiles").is_none());
        drop(rows);
        assert!(f.store.get(CLIENT_SESSION_KEY).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn restore_short_circuits_fresh_session() {
        let f = Fixture::new();
        *f.backend.expires_at.lock().unwrap() = Some(NOW_MS / 1000 + 3600);
        f.manager()
            .sign_up(AccountKind::Player, "a@b.c", "pw", "A", None)
            .await
            .unwrap();

        let restarted = f.manager();
        let session = restarted.restore(AccountKind::Player).await.unwrap();

        assert_eq!(session.access_token, FakeBackend::token_for(&session.user.id));
        assert_eq!(f.backend.get_user_calls.load(Ordering::SeqCst), 0);
        assert!(restarted.current(AccountKind::Player).await.is_some());
    }

    #[tokio::test]
    async fn restore_verifies_expired_session() {
        let f = Fixture::new();
        *f.backend.expires_at.lock().unwrap() = Some(NOW_MS / 1000 + 60);
        f.manager()
            .sign_up(AccountKind::Player, "a@b.c", "pw", "A", None)
            .await
            .unwrap();
        f.clock.advance_secs(120);

        let restarted = f.manager();
        assert!(restarted.restore(AccountKind::Player).await.is_some());
        assert_eq!(f.backend.get_user_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn rejected_session_is_cleared() {
        let f = Fixture::new();
        *f.backend.expires_at.lock().unwrap() = Some(NOW_MS / 1000);
        let session = f
            .manager()
            .sign_up(AccountKind::Player, "a@b.c", "pw", "A", None)
            .await
            .unwrap()
            .unwrap();
        f.backend.revoke(&session.access_token);

        let restarted = f.manager();
        assert!(restarted.restore(AccountKind::Player).await.is_none());
        assert_eq!(f.store.get(USER_SESSION_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn malformed_session_cache_is_ignored() {
        let f = Fixture::new();
        f.store
            .set(USER_SESSION_KEY, "not json".into())
            .await
            .unwrap();

        assert!(f.manager().restore(AccountKind::Player).await.is_none());
        assert_eq!(f.store.get(USER_SESSION_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn sign_out_clears_local_state_even_if_remote_fails() {
        let f = Fixture::new();
        let sessions = f.manager();
        sessions
            .sign_up(AccountKind::Player, "a@b.c", "pw", "A", None)
            .await
            .unwrap();
        f.store
            .set(USER_LOCATION_CACHE_KEY, "{}".into())
            .await
            .unwrap();
        f.backend.fail_sign_out.store(true, Ordering::SeqCst);

        sessions.sign_out(AccountKind::Player).await;

        assert!(sessions.current(AccountKind::Player).await.is_none());
        assert_eq!(f.store.get(USER_SESSION_KEY).await.unwrap(), None);
        assert_eq!(f.store.get(USER_LOCATION_CACHE_KEY).await.unwrap(), None);
        assert!(matches!(
            sessions.profile(AccountKind::Player).await,
            Err(AppError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn sign_in_then_update_profile() {
        let f = Fixture::new();
        f.manager()
            .sign_up(AccountKind::Player, "a@b.c", "pw", "A", None)
            .await
            .unwrap();

        let sessions = f.manager();
        assert!(sessions.sign_in(AccountKind::Player, "a@b.c", "wrong").await.is_err());
        let session = sessions.sign_in(AccountKind::Player, "a@b.c", "pw").await.unwrap();

        let profile = sessions
            .update_profile(
                AccountKind::Player,
                json!({ "id": "hijack", "full_name": "Asha K", "skill_level": "advanced" }),
            )
            .await
            .unwrap();
        assert_eq!(profile.id, session.user.id);
        assert_eq!(profile.full_name.as_deref(), Some("Asha K"));
        assert_eq!(profile.extra["skill_level"], "advanced");
    }
}
