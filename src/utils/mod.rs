use chrono::Utc;
use serde::{Deserialize, Serialize};

/// 地球平均半径（千米）
const EARTH_RADIUS_KM: f64 = 6371.0;

/// 经纬度坐标
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        calculate_distance(
            self.latitude,
            self.longitude,
            other.latitude,
            other.longitude,
        )
    }
}

// 使用Haversine公式计算球面距离，返回千米；NaN 输入原样传播
pub fn calculate_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_phi = (lat2 - lat1).to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let a = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// 不足 1 千米显示为米，否则保留一位小数的千米
pub fn format_distance(km: f64) -> String {
    // 先按米取整再判断单位，避免 999.6 m 显示成 "1000 m"
    let meters = (km * 1000.0).round();
    if meters < 1000.0 {
        format!("{} m", meters as i64)
    } else {
        format!("{:.1} km", km)
    }
}

/// 时间来源，毫秒级 Unix 时间戳
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

#[cfg(test)]
pub use test_clock::ManualClock;
