use serde::Serialize;

use crate::venue::filter::{ALL_SPORTS, FilterKind, VenueFilterState};

/// 已生效筛选条件的标签，移除操作为 `remove_filter(kind, value)`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterChip {
    pub kind: FilterKind,
    pub label: String,
    pub value: Option<String>,
}

impl FilterChip {
    fn new(kind: FilterKind, label: String, value: Option<String>) -> Self {
        Self { kind, label, value }
    }

    pub fn remove_from(&self, filters: &mut VenueFilterState) {
        filters.remove_filter(self.kind, self.value.as_deref());
    }
}

/// 每个非默认的筛选维度生成一个标签，运动类型每项一个
pub fn active_filter_chips(filters: &VenueFilterState) -> Vec<FilterChip> {
    let mut chips = Vec::new();

    if !filters.all_sports() {
        for sport in filters.sport_types().iter().filter(|s| *s != ALL_SPORTS) {
            chips.push(FilterChip::new(
                FilterKind::Sport,
                capitalize(sport),
                Some(sport.clone()),
            ));
        }
    }

    let distance = filters.distance_range();
    if !distance.is_default() {
        let label = if distance.min > 0.0 {
            format!("{}-{} km", distance.min, distance.max)
        } else {
            format!("Within {} km", distance.max)
        };
        chips.push(FilterChip::new(FilterKind::Distance, label, None));
    }

    let price = filters.price_range();
    if !price.is_default() {
        let label = if price.min > 0 {
            format!("Price {}-{}", price.min, price.max)
        } else {
            format!("Up to {}", price.max)
        };
        chips.push(FilterChip::new(FilterKind::Price, label, None));
    }

    if filters.min_rating() > 0.0 {
        chips.push(FilterChip::new(
            FilterKind::Rating,
            format!("{:.1}+ rating", filters.min_rating()),
            None,
        ));
    }

    if filters.is_search_active() {
        chips.push(FilterChip::new(
            FilterKind::Search,
            format!("\"{}\"", filters.search_query().trim()),
            None,
        ));
    }

    chips
}

/// 结果数量提示
pub fn results_summary(count: usize, filters: &VenueFilterState) -> String {
    let noun = if count == 1 { "venue" } else { "venues" };
    if filters.is_search_active() {
        format!(
            "{} {} found matching \"{}\"",
            count,
            noun,
            filters.search_query().trim()
        )
    } else {
        format!("{} {} found", count, noun)
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
