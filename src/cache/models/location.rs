use serde::{Deserialize, Serialize};

use crate::utils::Coordinate;

/// 位置缓存，存储格式 {coords, timestamp}
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct CachedLocation {
    pub coords: Coordinate,
    pub timestamp: i64, // 毫秒时间戳
}

impl CachedLocation {
    pub fn age_millis(&self, now: i64) -> i64 {
        (now - self.timestamp).max(0)
    }
}
