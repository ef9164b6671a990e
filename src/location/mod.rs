/// 位置服务
/// 设备定位接口与带有效期的位置缓存
pub mod cache;
pub mod provider;

pub use cache::{BACKGROUND_REFRESH_AFTER_MS, LOCATION_CACHE_TTL_MS, LocationCache};
pub use provider::{Accuracy, LocationProvider, NetworkLocationProvider, PermissionStatus};
