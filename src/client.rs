//! HTTP client for a running PlantPal server, used by the CLI.
//!
//! Configuration is via environment variables:
//! - `PLANTPAL_URL` - Base URL (default: `http://localhost:3000/api/v1`)
//! - `PLANTPAL_API_KEY` - API key, when the server requires one

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::docstore::PublicPlant;
use crate::models::*;

const DEFAULT_URL: &str = "http://localhost:3000/api/v1";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: API key required or invalid")]
    Unauthorized,

    #[error("Server error: {0}")]
    Server(String),
}

#[derive(Debug, Clone)]
pub struct PlantPalClient {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl PlantPalClient {
    pub fn from_env() -> Self {
        let base_url = std::env::var("PLANTPAL_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());
        let api_key = std::env::var("PLANTPAL_API_KEY")
            .ok()
            .filter(|k| !k.is_empty());
        Self::new(base_url, api_key)
    }

    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            client: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut req = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        req
    }

    async fn check(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::NOT_FOUND => ClientError::NotFound(body),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ClientError::BadRequest(body)
            }
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
            _ => ClientError::Server(format!("{}: {}", status, body)),
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.request(Method::GET, path).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let response = self.request(method, path).json(body).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn health(&self) -> Result<Value, ClientError> {
        self.get("/health").await
    }

    // ============================================================
    // Users
    // ============================================================

    pub async fn create_user(&self, input: &CreateUserInput) -> Result<User, ClientError> {
        self.send_json(Method::POST, "/users", input).await
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User, ClientError> {
        self.get(&format!("/users/{}", id)).await
    }

    pub async fn get_profile(&self, id: Uuid) -> Result<ProfileStats, ClientError> {
        self.get(&format!("/users/{}/profile", id)).await
    }

    // ============================================================
    // Moods
    // ============================================================

    pub async fn add_mood(
        &self,
        user_id: Uuid,
        input: &CreateMoodInput,
    ) -> Result<MoodEntry, ClientError> {
        self.send_json(Method::POST, &format!("/users/{}/moods", user_id), input)
            .await
    }

    pub async fn list_moods(
        &self,
        user_id: Uuid,
        limit: Option<u32>,
    ) -> Result<Vec<MoodEntry>, ClientError> {
        let path = match limit {
            Some(limit) => format!("/users/{}/moods?limit={}", user_id, limit),
            None => format!("/users/{}/moods", user_id),
        };
        self.get(&path).await
    }

    pub async fn latest_mood(&self, user_id: Uuid) -> Result<MoodCard, ClientError> {
        self.get(&format!("/users/{}/moods/latest", user_id)).await
    }

    // ============================================================
    // Plant documents
    // ============================================================

    pub async fn get_plant_doc(&self, user_id: &str) -> Result<Value, ClientError> {
        self.get(&format!("/plant-docs/{}", user_id)).await
    }

    pub async fn set_plant_doc(
        &self,
        user_id: &str,
        data: &Value,
        merge: bool,
    ) -> Result<Value, ClientError> {
        self.send_json(
            Method::PUT,
            &format!("/plant-docs/{}?merge={}", user_id, merge),
            data,
        )
        .await
    }

    pub async fn public_plants(&self) -> Result<Vec<PublicPlant>, ClientError> {
        self.get("/plant-docs").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_trailing_slash_from_base_url() {
        let client = PlantPalClient::new("http://example.com/api/v1/", None);
        assert_eq!(client.base_url(), "http://example.com/api/v1");
    }
}
