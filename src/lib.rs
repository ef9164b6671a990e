use std::sync::Arc;

use config::Config;

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod images;
pub mod location;
pub mod utils;
pub mod venue;

pub use error::{AppError, AppResult};

/// 应用上下文，启动时构建一次后传给各个页面
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn cache::KeyValueStore>,
    pub backend: Arc<dyn api::Backend>,
    pub sessions: Arc<auth::SessionManager>,
    pub location: location::LocationCache,
    pub preloader: Arc<images::ImagePreloader>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn cache::KeyValueStore>,
        backend: Arc<dyn api::Backend>,
        location_provider: Arc<dyn location::LocationProvider>,
        image_fetcher: Arc<dyn images::ImageFetcher>,
    ) -> Self {
        let sessions = Arc::new(auth::SessionManager::new(
            store.clone(),
            backend.clone(),
            &config,
        ));
        let location = location::LocationCache::new(store.clone(), location_provider);
        let preloader = Arc::new(images::ImagePreloader::with_timeout(
            image_fetcher,
            config.image_prefetch_timeout(),
        ));
        Self {
            config,
            store,
            backend,
            sessions,
            location,
            preloader,
        }
    }

    /// 场馆列表页的数据：定位、拉取场馆、筛选排序
    pub async fn load_venues(
        &self,
        filters: &venue::VenueFilterState,
    ) -> AppResult<Vec<venue::VenueRow>> {
        let user_location = self.location.get_location_fast().await;

        let token = match self.sessions.access_token(auth::AccountKind::Player).await {
            Some(token) => Some(token),
            None => self.sessions.access_token(auth::AccountKind::Client).await,
        };
        let venues = self.backend.list_venues(token.as_deref()).await?;

        let filtered = venue::apply(&venues, filters, user_location);
        Ok(venue::display_rows(filtered, user_location))
    }
}
