use async_trait::async_trait;
use chrono::Utc;
use postgrest::Postgrest;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::api::Backend;
use crate::api::models::{AuthSession, AuthUser, Profile, SignUpOutcome, error_message};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::venue::Venue;

/// Supabase 客户端：认证接口直接走 HTTP，数据表走 PostgREST
pub struct SupabaseClient {
    http: reqwest::Client,
    rest: Postgrest,
    auth_url: String,
    anon_key: String,
    venue_table: String,
}

impl SupabaseClient {
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        let rest = Postgrest::new(config.rest_url())
            .insert_header("apikey", config.baas_anon_key.clone());
        Self {
            http,
            rest,
            auth_url: config.auth_url(),
            anon_key: config.baas_anon_key.clone(),
            venue_table: config.venue_table.clone(),
        }
    }

    // 未登录时用匿名密钥
    fn table(&self, table: &str, access_token: Option<&str>) -> postgrest::Builder {
        self.rest
            .from(table)
            .auth(access_token.unwrap_or(&self.anon_key))
    }

    async fn auth_request(
        &self,
        method: reqwest::Method,
        path: &str,
        access_token: Option<&str>,
        body: Option<&Value>,
    ) -> AppResult<String> {
        let url = format!("{}{}", self.auth_url, path);
        let mut req = self
            .http
            .request(method, &url)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token.unwrap_or(&self.anon_key));
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            tracing::debug!("Auth request {} failed with {}", path, status);
            return Err(AppError::Backend {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }
        Ok(text)
    }

    async fn execute<T: DeserializeOwned>(builder: postgrest::Builder) -> AppResult<T> {
        let resp = builder
            .execute()
            .await
            .map_err(|e| AppError::Transport(e.to_string()))?;
        let status = resp.status().as_u16();
        let text = resp
            .text()
            .await
            .map_err(|e| AppError::Transport(e.to_string()))?;

        if !(200..300).contains(&status) {
            return Err(AppError::Backend {
                status,
                message: error_message(&text),
            });
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl Backend for SupabaseClient {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: Value,
    ) -> AppResult<SignUpOutcome> {
        let body = json!({ "email": email, "password": password, "data": metadata });
        let text = self
            .auth_request(reqwest::Method::POST, "/signup", None, Some(&body))
            .await?;
        SignUpOutcome::from_value(serde_json::from_str(&text)?, Utc::now().timestamp())
    }

    async fn sign_in(&self, email: &str, password: &str) -> AppResult<AuthSession> {
        let body = json!({ "email": email, "password": password });
        let text = self
            .auth_request(
                reqwest::Method::POST,
                "/token?grant_type=password",
                None,
                Some(&body),
            )
            .await?;
        let session: AuthSession = serde_json::from_str(&text)?;
        Ok(session.with_expiry(Utc::now().timestamp()))
    }

    async fn sign_out(&self, access_token: &str) -> AppResult<()> {
        self.auth_request(reqwest::Method::POST, "/logout", Some(access_token), None)
            .await?;
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> AppResult<AuthUser> {
        let text = self
            .auth_request(reqwest::Method::GET, "/user", Some(access_token), None)
            .await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn fetch_profile(
        &self,
        table: &str,
        id: &str,
        access_token: Option<&str>,
    ) -> AppResult<Option<Profile>> {
        let rows: Vec<Profile> = Self::execute(
            self.table(table, access_token)
                .select("*")
                .eq("id", id)
                .limit(1),
        )
        .await?;
        Ok(rows.into_iter().next())
    }

    async fn update_profile(
        &self,
        table: &str,
        id: &str,
        changes: &Value,
        access_token: Option<&str>,
    ) -> AppResult<Profile> {
        let rows: Vec<Profile> = Self::execute(
            self.table(table, access_token)
                .eq("id", id)
                .update(changes.to_string()),
        )
        .await?;
        rows.into_iter().next().ok_or(AppError::Backend {
            status: 404,
            message: format!("no {} row with id {}", table, id),
        })
    }

    async fn insert_row(
        &self,
        table: &str,
        row: &Value,
        access_token: Option<&str>,
    ) -> AppResult<Value> {
        let rows: Vec<Value> =
            Self::execute(self.table(table, access_token).insert(row.to_string())).await?;
        Ok(rows.into_iter().next().unwrap_or(Value::Null))
    }

    async fn list_venues(&self, access_token: Option<&str>) -> AppResult<Vec<Venue>> {
        let venues: Vec<Venue> =
            Self::execute(self.table(&self.venue_table, access_token).select("*")).await?;
        tracing::debug!("Loaded {} venues from {}", venues.len(), self.venue_table);
        Ok(venues)
    }
}
