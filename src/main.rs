use std::sync::Arc;

use courtside::{
    AppState,
    api::SupabaseClient,
    auth::AccountKind,
    cache::{KeyValueStore, MemoryStore, RedisStore},
    config::Config,
    images::HttpImageFetcher,
    location::NetworkLocationProvider,
    venue::{self, SortOption, VenueFilterState},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// 每个场馆预加载的图片数
const IMAGES_PER_VENUE: usize = 3;

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env().expect("Failed to load configuration");

    // 本地存储，Redis 不可用时退回内存
    let store: Arc<dyn KeyValueStore> =
        match RedisStore::open(&config.redis_url, config.storage_namespace.clone()) {
            Ok(redis) => match redis.ping().await {
                Ok(()) => Arc::new(redis),
                Err(e) => {
                    tracing::warn!("Redis unreachable ({}), using in-memory storage", e);
                    Arc::new(MemoryStore::new())
                }
            },
            Err(e) => {
                tracing::warn!("Invalid REDIS_URL ({}), using in-memory storage", e);
                Arc::new(MemoryStore::new())
            }
        };

    let http = reqwest::Client::new();
    let state = AppState::new(
        config.clone(),
        store,
        Arc::new(SupabaseClient::new(http.clone(), &config)),
        Arc::new(NetworkLocationProvider::from_config(http.clone(), &config)),
        Arc::new(HttpImageFetcher::new(http)),
    );

    // 恢复会话
    for kind in [AccountKind::Player, AccountKind::Client] {
        match state.sessions.restore(kind).await {
            Some(session) => tracing::info!("Restored {} session for {}", kind.as_str(), session.user.id),
            None => tracing::info!("No {} session", kind.as_str()),
        }
    }

    let filters = filters_from_env();
    let rows = match state.load_venues(&filters).await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!("Failed to load venues: {}", e);
            return;
        }
    };

    let venues: Vec<_> = rows.iter().map(|row| row.venue.clone()).collect();
    state
        .preloader
        .preload_venue_images(&venues, IMAGES_PER_VENUE)
        .await;

    for chip in venue::active_filter_chips(&filters) {
        tracing::info!("Filter: {}", chip.label);
    }
    tracing::info!("{}", venue::results_summary(rows.len(), &filters));
    for row in &rows {
        tracing::info!(
            "{} | {} | {} | {:.1} | {}",
            row.venue.name,
            row.venue.sport_types.join(", "),
            row.venue.price,
            row.venue.rating,
            row.distance_label.as_deref().unwrap_or("-")
        );
    }
}

// SEARCH / SPORT（逗号分隔）/ SORT / MAX_DISTANCE / MAX_PRICE / MIN_RATING
fn filters_from_env() -> VenueFilterState {
    let mut filters = VenueFilterState::new();

    if let Ok(query) = std::env::var("SEARCH") {
        filters.set_search_query(query);
    }
    if let Ok(sports) = std::env::var("SPORT") {
        for sport in sports.split(',') {
            filters.add_sport(sport);
        }
    }
    if let Ok(sort) = std::env::var("SORT") {
        match sort.parse::<SortOption>() {
            Ok(sort) => filters.set_sort_by(sort),
            Err(e) => tracing::warn!("{}", e),
        }
    }
    if let Some(max) = std::env::var("MAX_DISTANCE").ok().and_then(|v| v.parse().ok()) {
        filters.set_distance_range(0.0, max);
    }
    if let Some(max) = std::env::var("MAX_PRICE").ok().and_then(|v| v.parse().ok()) {
        filters.set_price_range(0, max);
    }
    if let Some(rating) = std::env::var("MIN_RATING").ok().and_then(|v| v.parse().ok()) {
        filters.set_min_rating(rating);
    }

    filters
}
