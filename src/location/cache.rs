use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::cache::keys::USER_LOCATION_CACHE_KEY;
use crate::cache::{CachedLocation, KeyValueStore, read_json, write_json};
use crate::location::provider::{Accuracy, LocationProvider, PermissionStatus};
use crate::utils::{Clock, Coordinate, SystemClock};

/// 缓存有效期：5 分钟
pub const LOCATION_CACHE_TTL_MS: i64 = 5 * 60 * 1000;

/// 缓存超过 3 分钟后在后台刷新
pub const BACKGROUND_REFRESH_AFTER_MS: i64 = 3 * 60 * 1000;

/// 带有效期的位置缓存
///
/// 后台刷新与前台获取之间不加锁，两者可能同时写入，以最后一次写入为准。
#[derive(Clone)]
pub struct LocationCache {
    store: Arc<dyn KeyValueStore>,
    provider: Arc<dyn LocationProvider>,
    clock: Arc<dyn Clock>,
    refreshing: Arc<AtomicBool>,
}

// 后台刷新结束时复位标记，任务被取消也一样
struct RefreshGuard(Arc<AtomicBool>);

impl Drop for RefreshGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl LocationCache {
    pub fn new(store: Arc<dyn KeyValueStore>, provider: Arc<dyn LocationProvider>) -> Self {
        Self::with_clock(store, provider, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<dyn KeyValueStore>,
        provider: Arc<dyn LocationProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            provider,
            clock,
            refreshing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 优先返回缓存位置，缓存缺失或过期时重新定位
    pub async fn get_location_fast(&self) -> Option<Coordinate> {
        if let Some(cached) = self.read_cached().await {
            let age = cached.age_millis(self.clock.now_millis());
            if age < LOCATION_CACHE_TTL_MS {
                if age >= BACKGROUND_REFRESH_AFTER_MS {
                    tracing::debug!("Location cache is {}ms old, refreshing in background", age);
                    self.spawn_background_refresh();
                } else {
                    tracing::debug!("Get location from cache ({}ms old)", age);
                }
                return Some(cached.coords);
            }
        }

        self.fetch_and_store(Accuracy::Low).await
    }

    /// 跳过缓存直接定位，成功后覆盖缓存
    pub async fn get_current_location(&self, accuracy: Accuracy) -> Option<Coordinate> {
        self.fetch_and_store(accuracy).await
    }

    pub async fn clear_cache(&self) {
        if let Err(e) = self.store.remove(USER_LOCATION_CACHE_KEY).await {
            tracing::warn!("Failed to clear location cache: {}", e);
        }
    }

    /// 距上次写入缓存的时间；无缓存时返回 None
    pub async fn get_cache_age(&self) -> Option<Duration> {
        let cached = self.read_cached().await?;
        let age = cached.age_millis(self.clock.now_millis());
        Some(Duration::from_millis(age as u64))
    }

    async fn read_cached(&self) -> Option<CachedLocation> {
        match read_json::<CachedLocation>(self.store.as_ref(), USER_LOCATION_CACHE_KEY).await {
            Ok(cached) => cached,
            Err(e) => {
                tracing::warn!("Failed to read location cache: {}", e);
                None
            }
        }
    }

    async fn fetch_and_store(&self, accuracy: Accuracy) -> Option<Coordinate> {
        match self.provider.request_foreground_permission().await {
            Ok(PermissionStatus::Granted) => {}
            Ok(PermissionStatus::Denied) => {
                tracing::debug!("Location permission denied");
                return None;
            }
            Err(e) => {
                tracing::warn!("Location permission request failed: {}", e);
                return None;
            }
        }

        let coords = match self.provider.current_position(accuracy).await {
            Ok(coords) => coords,
            Err(e) => {
                tracing::warn!("Failed to get current position: {}", e);
                return None;
            }
        };

        let entry = CachedLocation {
            coords,
            timestamp: self.clock.now_millis(),
        };
        if let Err(e) = write_json(self.store.as_ref(), USER_LOCATION_CACHE_KEY, &entry).await {
            tracing::warn!("Failed to write location cache: {}", e);
        }

        Some(coords)
    }

    // 不等待结果，失败只记录日志
    fn spawn_background_refresh(&self) {
        // 同一时间只允许一个后台刷新
        if self.refreshing.swap(true, Ordering::SeqCst) {
            tracing::debug!("Background location refresh already in flight");
            return;
        }
        let guard = RefreshGuard(self.refreshing.clone());
        let this = self.clone();
        tokio::spawn(async move {
            let _guard = guard;
            if this.fetch_and_store(Accuracy::Low).await.is_none() {
                tracing::warn!("Background location refresh produced no position");
            }
        });
    }
}
