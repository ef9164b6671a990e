use serde::Serialize;

use crate::utils::{Coordinate, format_distance};
use crate::venue::filter::{DEFAULT_MAX_DISTANCE_KM, SortOption, VenueFilterState};
use crate::venue::model::Venue;

/// 列表展示行
#[derive(Debug, Clone, Serialize)]
pub struct VenueRow {
    pub venue: Venue,
    pub distance_km: Option<f64>,
    pub distance_label: Option<String>,
}

/// 按筛选状态过滤并排序场馆
///
/// 纯函数，所有条件同时满足才保留；排序稳定，相等元素保持输入顺序。
/// 没有用户位置时不按距离筛选，距离排序退化为输入顺序。
pub fn apply(
    venues: &[Venue],
    filters: &VenueFilterState,
    user_location: Option<Coordinate>,
) -> Vec<Venue> {
    let query = filters.search_query().trim().to_lowercase();

    let mut matched: Vec<(&Venue, Option<f64>)> = venues
        .iter()
        .map(|venue| {
            let distance = user_location.map(|loc| loc.distance_to(&venue.coordinates()));
            (venue, distance)
        })
        .filter(|(venue, distance)| {
            matches_sport(venue, filters)
                && matches_distance(*distance, filters)
                && matches_price(venue, filters)
                && matches_rating(venue, filters)
                && matches_search(venue, &query)
        })
        .collect();

    sort_matches(&mut matched, filters.sort_by());

    matched.into_iter().map(|(venue, _)| venue.clone()).collect()
}

/// 给结果附上格式化后的距离
pub fn display_rows(venues: Vec<Venue>, user_location: Option<Coordinate>) -> Vec<VenueRow> {
    venues
        .into_iter()
        .map(|venue| {
            let distance_km = user_location.map(|loc| loc.distance_to(&venue.coordinates()));
            VenueRow {
                distance_label: distance_km.map(format_distance),
                distance_km,
                venue,
            }
        })
        .collect()
}

fn matches_sport(venue: &Venue, filters: &VenueFilterState) -> bool {
    if filters.all_sports() {
        return true;
    }
    filters
        .sport_types()
        .iter()
        .any(|sport| venue.offers_sport(sport))
}

fn matches_distance(distance: Option<f64>, filters: &VenueFilterState) -> bool {
    let range = filters.distance_range();
    // 上限不小于默认值时不按距离筛选，下限也随之失效
    if range.max >= DEFAULT_MAX_DISTANCE_KM {
        return true;
    }
    let Some(distance) = distance else {
        return true;
    };
    distance <= range.max && (range.min <= 0.0 || distance >= range.min)
}

fn matches_price(venue: &Venue, filters: &VenueFilterState) -> bool {
    let range = filters.price_range();
    if range.is_default() {
        return true;
    }
    venue.price <= range.max && (range.min <= 0 || venue.price >= range.min)
}

fn matches_rating(venue: &Venue, filters: &VenueFilterState) -> bool {
    filters.min_rating() <= 0.0 || venue.rating >= filters.min_rating()
}

fn matches_search(venue: &Venue, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    venue.name.to_lowercase().contains(query)
        || venue.location.to_lowercase().contains(query)
        || venue
            .sport_types
            .iter()
            .any(|sport| sport.to_lowercase().contains(query))
}

fn distance_key(entry: &(&Venue, Option<f64>)) -> f64 {
    entry.1.unwrap_or(f64::INFINITY)
}

// slice::sort_by 是稳定排序
fn sort_matches(matched: &mut [(&Venue, Option<f64>)], sort_by: SortOption) {
    match sort_by {
        SortOption::DistanceAsc | SortOption::DistanceDesc => {
            if matched.iter().any(|(_, distance)| distance.is_none()) {
                return;
            }
            if sort_by == SortOption::DistanceAsc {
                matched.sort_by(|a, b| distance_key(a).total_cmp(&distance_key(b)));
            } else {
                matched.sort_by(|a, b| distance_key(b).total_cmp(&distance_key(a)));
            }
        }
        SortOption::PriceAsc => matched.sort_by(|a, b| a.0.price.cmp(&b.0.price)),
        SortOption::PriceDesc => matched.sort_by(|a, b| b.0.price.cmp(&a.0.price)),
        SortOption::RatingAsc => matched.sort_by(|a, b| a.0.rating.total_cmp(&b.0.rating)),
        SortOption::RatingDesc => matched.sort_by(|a, b| b.0.rating.total_cmp(&a.0.rating)),
        SortOption::Popular => {
            matched.sort_by(|a, b| b.0.popularity.total_cmp(&a.0.popularity))
        }
    }
}
