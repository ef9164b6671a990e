use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use redis::{AsyncCommands, Client as RedisClient};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::RwLock;

use crate::cache::keys::namespaced;
use crate::error::AppResult;

/// 本地键值存储
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<String>>;
    async fn set(&self, key: &str, value: String) -> AppResult<()>;
    async fn remove(&self, key: &str) -> AppResult<()>;
}

/// Redis 存储
pub struct RedisStore {
    redis: Arc<RedisClient>,
    namespace: String,
}

impl RedisStore {
    pub fn new(redis: Arc<RedisClient>, namespace: impl Into<String>) -> Self {
        Self {
            redis,
            namespace: namespace.into(),
        }
    }

    pub fn open(redis_url: &str, namespace: impl Into<String>) -> AppResult<Self> {
        let client = RedisClient::open(redis_url)?;
        Ok(Self::new(Arc::new(client), namespace))
    }

    /// 检查连接是否可用
    pub async fn ping(&self) -> AppResult<()> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;
        let value: Option<String> = conn.get(namespaced(&self.namespace, key)).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String) -> AppResult<()> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;
        let _: () = conn.set(namespaced(&self.namespace, key), value).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;
        let _: () = conn.del(namespaced(&self.namespace, key)).await?;
        Ok(())
    }
}

/// 内存存储，Redis 不可用时的降级方案
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> AppResult<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// 读取 JSON 条目；解析失败时删除该条目并当作未命中
pub async fn read_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> AppResult<Option<T>> {
    let Some(raw) = store.get(key).await? else {
        return Ok(None);
    };

    match serde_json::from_str::<T>(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            tracing::warn!("Discarding malformed cache entry {}: {}", key, e);
            if let Err(e) = store.remove(key).await {
                tracing::warn!("Failed to remove malformed cache entry {}: {}", key, e);
            }
            Ok(None)
        }
    }
}

pub async fn write_json<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> AppResult<()> {
    let json = serde_json::to_string(value)?;
    store.set(key, json).await
}
