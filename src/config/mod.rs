use std::env;
use std::time::Duration;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub baas_url: String,
    pub baas_anon_key: String,
    pub redis_url: String,
    pub storage_namespace: String,
    pub location_api_url: String,
    pub location_enabled: bool,
    pub image_prefetch_timeout_secs: u64,
    pub player_profile_table: String,
    pub client_profile_table: String,
    pub venue_table: String,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();

        Ok(Config {
            baas_url: env::var("BAAS_URL")?,
            baas_anon_key: env::var("BAAS_ANON_KEY")?,
            redis_url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".into()),
            storage_namespace: env::var("STORAGE_NAMESPACE")
                .unwrap_or_else(|_| "courtside:".into()),
            location_api_url: env::var("LOCATION_API_URL")
                .unwrap_or_else(|_| "https://ipapi.co/json/".into()),
            location_enabled: env::var("LOCATION_ENABLED")
                .map(|v| !matches!(v.trim().to_lowercase().as_str(), "false" | "0" | "no"))
                .unwrap_or(true),
            image_prefetch_timeout_secs: env::var("IMAGE_PREFETCH_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            player_profile_table: env::var("PLAYER_PROFILE_TABLE")
                .unwrap_or_else(|_| "profiles".into()),
            client_profile_table: env::var("CLIENT_PROFILE_TABLE")
                .unwrap_or_else(|_| "clients".into()),
            venue_table: env::var("VENUE_TABLE").unwrap_or_else(|_| "venues".into()),
        })
    }

    pub fn image_prefetch_timeout(&self) -> Duration {
        Duration::from_secs(self.image_prefetch_timeout_secs)
    }

    /// 认证接口根地址
    pub fn auth_url(&self) -> String {
        format!("{}/auth/v1", self.baas_url.trim_end_matches('/'))
    }

    /// 数据表接口根地址
    pub fn rest_url(&self) -> String {
        format!("{}/rest/v1", self.baas_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Config {
            baas_url: "http://localhost:54321/".into(),
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
}
