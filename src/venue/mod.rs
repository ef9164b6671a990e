/// 场馆筛选
/// 场馆模型、筛选状态、筛选排序与筛选标签
pub mod chips;
pub mod engine;
pub mod filter;
pub mod model;

pub use chips::{FilterChip, active_filter_chips, results_summary};
pub use engine::{VenueRow, apply, display_rows};
pub use filter::{
    ALL_SPORTS, DEFAULT_MAX_DISTANCE_KM, DEFAULT_MAX_PRICE, DistanceRange, FilterKind, PriceRange,
    SortOption, VenueFilterState,
};
pub use model::Venue;
