use async_trait::async_trait;
use serde::Deserialize;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::utils::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// 定位精度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Accuracy {
    Lowest,
    #[default]
    Low,
    Balanced,
    High,
    Highest,
}

/// 设备定位接口
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// 申请前台定位权限
    async fn request_foreground_permission(&self) -> AppResult<PermissionStatus>;

    /// 获取一次当前位置
    async fn current_position(&self, accuracy: Accuracy) -> AppResult<Coordinate>;
}

#[derive(Debug, Deserialize)]
struct PositionResponse {
    latitude: Option<f64>,
    longitude: Option<f64>,
    lat: Option<f64>,
    lon: Option<f64>,
    lng: Option<f64>,
}

/// 通过 HTTP 地理定位接口获取近似位置
pub struct NetworkLocationProvider {
    client: reqwest::Client,
    url: String,
    enabled: bool,
}

impl NetworkLocationProvider {
    pub fn new(client: reqwest::Client, url: impl Into<String>, enabled: bool) -> Self {
        Self {
            client,
            url: url.into(),
            enabled,
        }
    }

    pub fn from_config(client: reqwest::Client, config: &Config) -> Self {
        Self::new(client, config.location_api_url.clone(), config.location_enabled)
    }
}

#[async_trait]
impl LocationProvider for NetworkLocationProvider {
    async fn request_foreground_permission(&self) -> AppResult<PermissionStatus> {
        Ok(if self.enabled {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        })
    }

    // 网络定位只有一种精度
    async fn current_position(&self, _accuracy: Accuracy) -> AppResult<Coordinate> {
        let resp = self.client.get(&self.url).send().await?;
        if !resp.status().is_success() {
            return Err(AppError::Location(format!(
                "position endpoint returned {}",
                resp.status()
            )));
        }

        let body: PositionResponse = resp.json().await?;
        let latitude = body.latitude.or(body.lat);
        let longitude = body.longitude.or(body.lon).or(body.lng);

        match (latitude, longitude) {
            (Some(latitude), Some(longitude)) => Ok(Coordinate::new(latitude, longitude)),
            _ => Err(AppError::Location(
                "position response has no coordinates".into(),
            )),
        }
    }
}

#[cfg(test)]
pub use fake::FakeLocationProvider;
