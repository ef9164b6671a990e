use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 不限运动类型
pub const ALL_SPORTS: &str = "all";

/// 距离上限默认值（千米），等于默认值时不按距离筛选
pub const DEFAULT_MAX_DISTANCE_KM: f64 = 50.0;

/// 价格上限默认值
pub const DEFAULT_MAX_PRICE: i64 = 100_000;

pub const MAX_RATING: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceRange {
    pub min: f64,
    pub max: f64,
}

impl Default for DistanceRange {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: DEFAULT_MAX_DISTANCE_KM,
        }
    }
}

impl DistanceRange {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: i64,
    pub max: i64,
}

impl Default for PriceRange {
    fn default() -> Self {
        Self {
            min: 0,
            max: DEFAULT_MAX_PRICE,
        }
    }
}

impl PriceRange {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOption {
    #[default]
    DistanceAsc,
    DistanceDesc,
    PriceAsc,
    PriceDesc,
    RatingDesc,
    RatingAsc,
    Popular,
}

impl SortOption {
    pub const ALL: [SortOption; 7] = [
        SortOption::DistanceAsc,
        SortOption::DistanceDesc,
        SortOption::PriceAsc,
        SortOption::PriceDesc,
        SortOption::RatingDesc,
        SortOption::RatingAsc,
        SortOption::Popular,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOption::DistanceAsc => "distance-asc",
            SortOption::DistanceDesc => "distance-desc",
            SortOption::PriceAsc => "price-asc",
            SortOption::PriceDesc => "price-desc",
            SortOption::RatingDesc => "rating-desc",
            SortOption::RatingAsc => "rating-asc",
            SortOption::Popular => "popular",
        }
    }

    /// 排序菜单显示文字
    pub fn label(&self) -> &'static str {
        match self {
            SortOption::DistanceAsc => "Distance: Nearest first",
            SortOption::DistanceDesc => "Distance: Farthest first",
            SortOption::PriceAsc => "Price: Low to High",
            SortOption::PriceDesc => "Price: High to Low",
            SortOption::RatingDesc => "Rating: High to Low",
            SortOption::RatingAsc => "Rating: Low to High",
            SortOption::Popular => "Most popular",
        }
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortOption::ALL
            .into_iter()
            .find(|opt| opt.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown sort option: {}", s))
    }
}

/// 筛选维度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    Sport,
    Distance,
    Price,
    Rating,
    Search,
}

/// 场馆列表的筛选状态，只通过下面的方法修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueFilterState {
    sport_types: BTreeSet<String>,
    distance_range: DistanceRange,
    price_range: PriceRange,
    min_rating: f64,
    search_query: String,
    sort_by: SortOption,
}

impl Default for VenueFilterState {
    fn default() -> Self {
        Self {
            sport_types: BTreeSet::from([ALL_SPORTS.to_string()]),
            distance_range: DistanceRange::default(),
            price_range: PriceRange::default(),
            min_rating: 0.0,
            search_query: String::new(),
            sort_by: SortOption::default(),
        }
    }
}

impl VenueFilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sport_types(&self) -> &BTreeSet<String> {
        &self.sport_types
    }

    pub fn distance_range(&self) -> DistanceRange {
        self.distance_range
    }

    pub fn price_range(&self) -> PriceRange {
        self.price_range
    }

    pub fn min_rating(&self) -> f64 {
        self.min_rating
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn sort_by(&self) -> SortOption {
        self.sort_by
    }

    pub fn all_sports(&self) -> bool {
        self.sport_types.contains(ALL_SPORTS)
    }

    /// 选择具体运动时去掉 "all"
    pub fn add_sport(&mut self, sport: &str) {
        let sport = sport.trim().to_lowercase();
        if sport.is_empty() {
            return;
        }
        if sport == ALL_SPORTS {
            self.reset_sports();
            return;
        }
        self.sport_types.remove(ALL_SPORTS);
        self.sport_types.insert(sport);
    }

    /// 移除最后一个运动后恢复为 "all"
    pub fn remove_sport(&mut self, sport: &str) {
        self.sport_types.remove(&sport.trim().to_lowercase());
        if self.sport_types.is_empty() {
            self.reset_sports();
        }
    }

    pub fn toggle_sport(&mut self, sport: &str) {
        let key = sport.trim().to_lowercase();
        if self.sport_types.contains(&key) && key != ALL_SPORTS {
            self.remove_sport(&key);
        } else {
            self.add_sport(&key);
        }
    }

    fn reset_sports(&mut self) {
        self.sport_types = BTreeSet::from([ALL_SPORTS.to_string()]);
    }

    pub fn set_distance_range(&mut self, min: f64, max: f64) {
        let min = if min.is_finite() { min.max(0.0) } else { 0.0 };
        let max = if max.is_finite() {
            max.max(0.0)
        } else {
            DEFAULT_MAX_DISTANCE_KM
        };
        self.distance_range = DistanceRange {
            min: min.min(max),
            max: max.max(min),
        };
    }

    pub fn set_price_range(&mut self, min: i64, max: i64) {
        let (min, max) = (min.max(0), max.max(0));
        self.price_range = PriceRange {
            min: min.min(max),
            max: max.max(min),
        };
    }

    pub fn set_min_rating(&mut self, rating: f64) {
        self.min_rating = if rating.is_nan() {
            0.0
        } else {
            rating.clamp(0.0, MAX_RATING)
        };
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    pub fn set_sort_by(&mut self, sort_by: SortOption) {
        self.sort_by = sort_by;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// 把某个筛选维度恢复为默认值；运动类型带 value 时只移除该运动
    pub fn remove_filter(&mut self, kind: FilterKind, value: Option<&str>) {
        match kind {
            FilterKind::Sport => match value {
                Some(sport) => self.remove_sport(sport),
                None => self.reset_sports(),
            },
            FilterKind::Distance => self.distance_range = DistanceRange::default(),
            FilterKind::Price => self.price_range = PriceRange::default(),
            FilterKind::Rating => self.min_rating = 0.0,
            FilterKind::Search => self.search_query.clear(),
        }
    }

    pub fn is_search_active(&self) -> bool {
        !self.search_query.trim().is_empty()
    }

    /// 非默认的筛选维度个数（不含排序）
    pub fn active_filter_count(&self) -> usize {
        [
            !self.all_sports(),
            !self.distance_range.is_default(),
            !self.price_range.is_default(),
            self.min_rating > 0.0,
            self.is_search_active(),
        ]
        .into_iter()
        .filter(|active| *active)
        .count()
    }

    pub fn has_active_filters(&self) -> bool {
        self.active_filter_count() > 0
    }
}
