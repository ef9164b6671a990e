use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{AppError, AppResult};
use crate::images::source::ImageSource;

/// 单张图片的加载
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, source: &ImageSource) -> AppResult<()>;

    /// 丢弃已缓存的图片
    async fn clear(&self) {}
}

/// 内存图片缓存默认容量（张）
pub const DEFAULT_IMAGE_CACHE_CAPACITY: usize = 200;

// 按写入顺序淘汰最早的图片
#[derive(Default)]
struct ImageCache {
    bytes: HashMap<ImageSource, Vec<u8>>,
    order: VecDeque<ImageSource>,
}

impl ImageCache {
    fn insert(&mut self, source: ImageSource, bytes: Vec<u8>, capacity: usize) {
        if self.bytes.insert(source.clone(), bytes).is_none() {
            self.order.push_back(source);
        }
        while self.bytes.len() > capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.bytes.remove(&oldest);
        }
    }

    fn clear(&mut self) {
        self.bytes.clear();
        self.order.clear();
    }
}

/// 远程图片走 HTTP，打包资源读本地文件，结果保存在内存图片缓存中
pub struct HttpImageFetcher {
    client: reqwest::Client,
    images: RwLock<ImageCache>,
    capacity: usize,
}

impl HttpImageFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_capacity(client, DEFAULT_IMAGE_CACHE_CAPACITY)
    }

    pub fn with_capacity(client: reqwest::Client, capacity: usize) -> Self {
        Self {
            client,
            images: RwLock::new(ImageCache::default()),
            capacity: capacity.max(1),
        }
    }

    pub async fn cached(&self, source: &ImageSource) -> Option<Vec<u8>> {
        self.images.read().await.bytes.get(source).cloned()
    }

    pub async fn cached_count(&self) -> usize {
        self.images.read().await.bytes.len()
    }

    async fn load(&self, source: &ImageSource) -> AppResult<Vec<u8>> {
        match source {
            ImageSource::Remote { uri } => {
                let resp = self.client.get(uri).send().await?;
                if !resp.status().is_success() {
                    return Err(AppError::Image(format!("{} returned {}", uri, resp.status())));
                }
                Ok(resp.bytes().await?.to_vec())
            }
            ImageSource::Bundled { path } => Ok(tokio::fs::read(path).await?),
        }
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, source: &ImageSource) -> AppResult<()> {
        if self.images.read().await.bytes.contains_key(source) {
            return Ok(());
        }

        let bytes = self.load(source).await?;
        if bytes.is_empty() {
            return Err(AppError::Image(format!("{} is empty", source.location())));
        }

        self.images
            .write()
            .await
            .insert(source.clone(), bytes, self.capacity);
        Ok(())
    }

    async fn clear(&self) {
        self.images.write().await.clear();
    }
}
