use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use courtside::api::Backend;
use courtside::api::models::{AuthSession, AuthUser, Profile, SignUpOutcome};
use courtside::cache::keys::USER_LOCATION_CACHE_KEY;
use courtside::cache::{KeyValueStore, MemoryStore};
use courtside::config::Config;
use courtside::images::{ImageFetcher, ImageSource};
use courtside::location::{Accuracy, LocationProvider, PermissionStatus};
use courtside::utils::Coordinate;
use courtside::venue::{self, SortOption, Venue, VenueFilterState};
use courtside::{AppError, AppResult, AppState};

const USER: Coordinate = Coordinate {
    latitude: 12.9716,
    longitude: 77.5946,
};

// A 在用户以北 2 千米，B 在 10 千米
fn backend_rows() -> Value {
    json!([
        {
            "id": "a",
            "name": "A",
            "address": "Indiranagar",
            "latitude": USER.latitude + 2.0 / 111.195,
            "longitude": USER.longitude,
            "price": 500,
            "rating": 4.5,
            "sport": "tennis",
            "images": ["https://cdn.example.com/a.jpg"]
        },
        {
            "id": "b",
            "name": "B",
            "address": "Koramangala",
            "latitude": USER.latitude + 10.0 / 111.195,
            "longitude": USER.longitude,
            "price": 300,
            "rating": 3.0,
            "sport_types": ["football"],
            "images": [{"uri": "https://cdn.example.com/b.jpg"}]
        }
    ])
}

fn venues() -> Vec<Venue> {
    serde_json::from_value(backend_rows()).unwrap()
}

fn names(venues: &[Venue]) -> Vec<&str> {
    venues.iter().map(|v| v.name.as_str()).collect()
}

#[test]
fn tennis_within_five_km() {
    let mut filters = VenueFilterState::new();
    filters.add_sport("tennis");
    filters.set_distance_range(0.0, 5.0);
    filters.set_sort_by(SortOption::DistanceAsc);

    assert_eq!(names(&venue::apply(&venues(), &filters, Some(USER))), vec!["A"]);
}

#[test]
fn search_for_foot() {
    let mut filters = VenueFilterState::new();
    filters.set_search_query("foot");

    assert_eq!(names(&venue::apply(&venues(), &filters, Some(USER))), vec!["B"]);
}

#[test]
fn chips_round_trip_to_default() {
    let mut filters = VenueFilterState::new();
    filters.add_sport("tennis");
    filters.set_min_rating(4.0);

    let chips = venue::active_filter_chips(&filters);
    assert_eq!(chips.len(), 2);
    for chip in &chips {
        filters.remove_filter(chip.kind, chip.value.as_deref());
    }
    assert!(!filters.has_active_filters());
    assert_eq!(venue::apply(&venues(), &filters, None).len(), 2);
}

struct StaticBackend;

#[async_trait]
impl Backend for StaticBackend {
    async fn sign_up(&self, _: &str, _: &str, _: Value) -> AppResult<SignUpOutcome> {
        Err(AppError::NotAuthenticated)
    }

    async fn sign_in(&self, _: &str, _: &str) -> AppResult<AuthSession> {
        Err(AppError::NotAuthenticated)
    }

    async fn sign_out(&self, _: &str) -> AppResult<()> {
        Ok(())
    }

    async fn get_user(&self, _: &str) -> AppResult<AuthUser> {
        Err(AppError::NotAuthenticated)
    }

    async fn fetch_profile(&self, _: &str, _: &str, _: Option<&str>) -> AppResult<Option<Profile>> {
        Ok(None)
    }

    async fn update_profile(
        &self,
        _: &str,
        id: &str,
        _: &Value,
        _: Option<&str>,
    ) -> AppResult<Profile> {
        Ok(Profile::new(id))
    }

    async fn insert_row(&self, _: &str, row: &Value, _: Option<&str>) -> AppResult<Value> {
        Ok(row.clone())
    }

    async fn list_venues(&self, _: Option<&str>) -> AppResult<Vec<Venue>> {
        Ok(venues())
    }
}

struct DeniedLocation;

#[async_trait]
impl LocationProvider for DeniedLocation {
    async fn request_foreground_permission(&self) -> AppResult<PermissionStatus> {
        Ok(PermissionStatus::Denied)
    }

    async fn current_position(&self, _: Accuracy) -> AppResult<Coordinate> {
        Err(AppError::Location("should not be called".into()))
    }
}

struct FixedLocation;

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn request_foreground_permission(&self) -> AppResult<PermissionStatus> {
        Ok(PermissionStatus::Granted)
    }

    async fn current_position(&self, _: Accuracy) -> AppResult<Coordinate> {
        Ok(USER)
    }
}

struct NoopFetcher;

#[async_trait]
impl ImageFetcher for NoopFetcher {
    async fn fetch(&self, _: &ImageSource) -> AppResult<()> {
        Ok(())
    }
}

fn test_config() -> Config {
    Config {
        baas_url: "http://localhost:54321".into(),
        baas_anon_key: "anon".into(),
        redis_url: "redis://127.0.0.1/".into(),
        storage_namespace: "test:".into(),
        location_api_url: "http://localhost/json".into(),
        location_enabled: true,
        image_prefetch_timeout_secs: 10,
        player_profile_table: "profiles".into(),
        client_profile_table: "clients".into(),
        venue_table: "venues".into(),
    }
}

fn app(location: Arc<dyn LocationProvider>) -> (AppState, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(
        test_config(),
        store.clone(),
        Arc::new(StaticBackend),
        location,
        Arc::new(NoopFetcher),
    );
    (state, store)
}

#[tokio::test]
async fn venue_list_without_location_permission() {
    let (state, store) = app(Arc::new(DeniedLocation));

    assert_eq!(state.location.get_location_fast().await, None);
    assert_eq!(store.get(USER_LOCATION_CACHE_KEY).await.unwrap(), None);

    let rows = state.load_venues(&VenueFilterState::new()).await.unwrap();
    let names: Vec<&str> = rows.iter().map(|r| r.venue.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B"]);
    assert!(rows.iter().all(|r| r.distance_label.is_none()));
}

#[tokio::test]
async fn venue_list_sorted_by_price_with_distances() {
    let (state, store) = app(Arc::new(FixedLocation));
    let mut filters = VenueFilterState::new();
    filters.set_sort_by(SortOption::PriceAsc);

    let rows = state.load_venues(&filters).await.unwrap();
    let labels: Vec<(&str, Option<&str>)> = rows
        .iter()
        .map(|r| (r.venue.name.as_str(), r.distance_label.as_deref()))
        .collect();
    assert_eq!(labels, vec![("B", Some("10.0 km")), ("A", Some("2.0 km"))]);
    assert!(store.get(USER_LOCATION_CACHE_KEY).await.unwrap().is_some());

    let venues: Vec<Venue> = rows.into_iter().map(|r| r.venue).collect();
    let stats = state.preloader.preload_venue_images(&venues, 3).await;
    assert_eq!(stats.loaded_count, 2);
    assert_eq!(stats.failed_count, 0);
}
