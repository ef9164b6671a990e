use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::join_all;
use serde::Serialize;

use crate::images::fetcher::ImageFetcher;
use crate::images::source::ImageSource;
use crate::venue::Venue;

/// 单张图片的默认超时
pub const DEFAULT_PREFETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PreloadStats {
    pub loaded_count: usize,
    pub failed_count: usize,
    pub total_count: usize,
}

/// 图片预加载上下文
///
/// 记录已成功加载的图片用于去重；`preloading` 标记保证同一时间只有一轮场馆图片预加载。
pub struct ImagePreloader {
    fetcher: Arc<dyn ImageFetcher>,
    timeout: Duration,
    seen: Mutex<HashSet<ImageSource>>,
    preloading: AtomicBool,
}

// 离开作用域时清除预加载标记
struct PreloadingGuard<'a>(&'a AtomicBool);

impl Drop for PreloadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl ImagePreloader {
    pub fn new(fetcher: Arc<dyn ImageFetcher>) -> Self {
        Self::with_timeout(fetcher, DEFAULT_PREFETCH_TIMEOUT)
    }

    pub fn with_timeout(fetcher: Arc<dyn ImageFetcher>, timeout: Duration) -> Self {
        Self {
            fetcher,
            timeout,
            seen: Mutex::new(HashSet::new()),
            preloading: AtomicBool::new(false),
        }
    }

    pub async fn preload_remote_images(&self, urls: &[String]) -> PreloadStats {
        let sources = urls
            .iter()
            .map(|url| url.trim())
            .filter(|url| !url.is_empty())
            .map(ImageSource::remote)
            .collect();
        self.preload(sources).await
    }

    /// 预加载打包在应用内的图片资源
    pub async fn preload_static_assets(&self, assets: &[String]) -> PreloadStats {
        let sources = assets.iter().map(ImageSource::bundled).collect();
        self.preload(sources).await
    }

    /// 预加载场馆图片，每个场馆最多取 per_venue 张；已有一轮在进行时直接返回空结果
    pub async fn preload_venue_images(&self, venues: &[Venue], per_venue: usize) -> PreloadStats {
        if self.preloading.swap(true, Ordering::SeqCst) {
            tracing::debug!("Venue image preload already running, skipping");
            return PreloadStats::default();
        }
        let _guard = PreloadingGuard(&self.preloading);

        let sources = venues
            .iter()
            .flat_map(|venue| venue.images.iter().take(per_venue).cloned())
            .collect();
        self.preload(sources).await
    }

    pub fn is_preloading(&self) -> bool {
        self.preloading.load(Ordering::SeqCst)
    }

    pub fn is_loaded(&self, source: &ImageSource) -> bool {
        self.seen_set().contains(source)
    }

    /// 清空去重记录和加载器里的图片缓存
    pub async fn clear(&self) {
        self.seen_set().clear();
        self.fetcher.clear().await;
    }

    fn seen_set(&self) -> std::sync::MutexGuard<'_, HashSet<ImageSource>> {
        self.seen.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn preload(&self, sources: Vec<ImageSource>) -> PreloadStats {
        let pending: Vec<ImageSource> = {
            let seen = self.seen_set();
            let mut batch = HashSet::new();
            sources
                .into_iter()
                .filter(|source| !seen.contains(source) && batch.insert(source.clone()))
                .collect()
        };

        let mut stats = PreloadStats {
            total_count: pending.len(),
            ..PreloadStats::default()
        };
        if pending.is_empty() {
            return stats;
        }

        let results = join_all(pending.iter().map(|source| self.fetch_one(source))).await;

        let mut seen = self.seen_set();
        for (source, loaded) in pending.into_iter().zip(results) {
            if loaded {
                stats.loaded_count += 1;
                seen.insert(source);
            } else {
                stats.failed_count += 1;
            }
        }

        tracing::info!(
            "Preloaded {}/{} images ({} failed)",
            stats.loaded_count,
            stats.total_count,
            stats.failed_count
        );
        stats
    }

    async fn fetch_one(&self, source: &ImageSource) -> bool {
        match tokio::time::timeout(self.timeout, self.fetcher.fetch(source)).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::warn!("Failed to preload image {}: {}", source.location(), e);
                false
            }
            Err(_) => {
                tracing::warn!(
                    "Preloading image {} timed out after {:?}",
                    source.location(),
                    self.timeout
                );
                false
            }
        }
    }
}
