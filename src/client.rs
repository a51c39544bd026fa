use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use tracing::{error, info};

use crate::error::{TryOnError, GENERIC_FAILURE};
use crate::models::{ApiErrorBody, LoginReply, LoginRequest, TryOnResponse};
use crate::request::TryOnForm;

/// The remote try-on service as the rest of the crate sees it.
#[async_trait]
pub trait TryOnApi: Send + Sync {
    async fn try_on(&self, form: TryOnForm) -> Result<TryOnResponse, TryOnError>;

    async fn login(&self, username: &str, password: &str) -> Result<LoginReply, TryOnError>;
}

pub struct TryOnClient {
    client: Client,
    base_url: String,
}

impl TryOnClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str { &self.base_url }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn transport(context: &str, e: impl std::fmt::Display) -> TryOnError {
    error!("❌ {} failed: {}", context, e);
    TryOnError::Transport(format!("{context}: {e}"))
}

/// Turns a non-2xx response into the error the user gets to read.
async fn server_error(response: Response) -> TryOnError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    error!("❌ API error response: status={} body={}", status, truncate(&body, 300));
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .ok()
        .and_then(|b| b.text().map(str::to_string))
        .unwrap_or_else(|| GENERIC_FAILURE.to_string());
    TryOnError::Server { status: status.as_u16(), message }
}

#[async_trait]
impl TryOnApi for TryOnClient {
    async fn try_on(&self, form: TryOnForm) -> Result<TryOnResponse, TryOnError> {
        let url = self.endpoint("/api/try-on");
        let sizes: Vec<String> = ["person_image", "cloth_image"]
            .iter()
            .filter_map(|name| form.file(name).map(|f| format!("{}={}B ({})", name, f.len(), f.mime_type)))
            .collect();
        info!("🔗 Posting try-on request to {} [{}]", url, sizes.join(", "));

        let response = self.client
            .post(&url)
            .multipart(form.into_multipart()?)
            .send()
            .await
            .map_err(|e| transport("try-on request", e))?;

        let status = response.status();
        info!("📥 Response status: {}", status);
        if !status.is_success() {
            return Err(server_error(response).await);
        }

        let text = response.text().await.map_err(|e| transport("reading try-on response", e))?;
        serde_json::from_str::<TryOnResponse>(&text)
            .map_err(|e| transport("parsing try-on response", format!("{}: {}", e, truncate(&text, 200))))
    }

    async fn login(&self, username: &str, password: &str) -> Result<LoginReply, TryOnError> {
        let url = self.endpoint("/api/login");
        info!("🔐 Logging in as '{}'", username);

        let body = LoginRequest { username: username.to_string(), password: password.to_string() };
        let response = self.client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport("login request", e))?;

        if !response.status().is_success() {
            return Err(server_error(response).await);
        }
        // A 2xx without a readable body is still a successful login.
        Ok(response.json::<LoginReply>().await.unwrap_or_default())
    }
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max { return s; }
    let cut = (0..=max).rev().find(|i| s.is_char_boundary(*i)).unwrap_or(0);
    &s[..cut]
}
