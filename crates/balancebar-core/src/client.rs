//! Balance fetch from OpenRouter
//!
//! `GET https://openrouter.ai/api/v1/key` with the key as bearer token.
//! Failures surface as `CoreError::Upstream` with a user-facing message;
//! the engine never retries.

use crate::credentials::validate_key_format;
use crate::error::{CoreError, Result};
use balancebar_types::{Balance, Money};
use reqwest::StatusCode;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

/// OpenRouter key info endpoint
pub const OPENROUTER_KEY_URL: &str = "https://openrouter.ai/api/v1/key";

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Anything that can turn an API key into a balance snapshot
pub trait BalanceSource {
    fn fetch_balance(&self, api_key: &str) -> impl Future<Output = Result<Balance>> + Send;
}

/// Check that a key is well-formed and actually authenticates.
///
/// Returns the balance fetched along the way so the caller can display it
/// and reuse the provider's label.
pub async fn verify_key<S: BalanceSource>(source: &S, api_key: &str) -> Result<Balance> {
    validate_key_format(api_key)?;
    source.fetch_balance(api_key.trim()).await
}

/// Key info response envelope
#[derive(Debug, Deserialize)]
struct KeyResponse {
    data: Option<KeyData>,
    error: Option<ProviderError>,
}

#[derive(Debug, Deserialize)]
struct KeyData {
    #[serde(default)]
    limit: Option<Money>,
    #[serde(default)]
    limit_remaining: Option<Money>,
    #[serde(default)]
    usage: Option<Money>,
    #[serde(default)]
    usage_daily: Option<Money>,
    #[serde(default)]
    usage_weekly: Option<Money>,
    #[serde(default)]
    usage_monthly: Option<Money>,
    #[serde(default)]
    label: Option<String>,
}

/// Providers send either a bare string or `{ "message": ... }`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProviderError {
    Message(String),
    Object { message: String },
}

impl ProviderError {
    fn into_message(self) -> String {
        match self {
            Self::Message(message) | Self::Object { message } => message,
        }
    }
}

impl From<KeyData> for Balance {
    fn from(data: KeyData) -> Self {
        let usage_monthly = data.usage_monthly.or(data.usage);
        let mut balance = Balance::from_limit_and_usage(data.limit, usage_monthly, data.label);
        if data.limit_remaining.is_some() {
            balance.remaining_monthly = data.limit_remaining;
        }
        balance.usage_weekly = data.usage_weekly;
        balance.usage_daily = data.usage_daily;
        balance
    }
}

/// HTTP client for the OpenRouter key endpoint
#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    http: reqwest::Client,
    endpoint: String,
}

impl OpenRouterClient {
    pub fn new() -> Result<Self> {
        Self::with_endpoint(OPENROUTER_KEY_URL)
    }

    /// Client against a different endpoint (proxies, test servers)
    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                warn!(error = %e, "Failed to build HTTP client");
                CoreError::upstream("Could not initialize network client. Please restart the app.")
            })?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn request(&self, api_key: &str) -> Result<Balance> {
        validate_key_format(api_key)?;

        info!(endpoint = %self.endpoint, "Fetching balance");
        let response = self
            .http
            .get(&self.endpoint)
            .bearer_auth(api_key.trim())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Balance request failed");
                CoreError::upstream(transport_message(&e))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            warn!(error = %e, "Failed to read balance response");
            CoreError::upstream(transport_message(&e))
        })?;

        interpret_response(status, &body)
    }
}

impl BalanceSource for OpenRouterClient {
    fn fetch_balance(&self, api_key: &str) -> impl Future<Output = Result<Balance>> + Send {
        let api_key = api_key.to_string();
        async move { self.request(&api_key).await }
    }
}

fn transport_message(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "Request timed out. Check your internet connection.".to_string()
    } else if error.is_connect() {
        "Could not connect to OpenRouter. Check your internet connection.".to_string()
    } else {
        format!("Network error: {}", error)
    }
}

/// Map an HTTP status and body to a balance or a user-facing error
pub(crate) fn interpret_response(status: StatusCode, body: &str) -> Result<Balance> {
    if status == StatusCode::UNAUTHORIZED {
        return Err(CoreError::upstream(
            "Invalid API key. Please check your key and try again.",
        ));
    }

    if !status.is_success() {
        return Err(CoreError::upstream(format!(
            "API request failed with status: {}",
            status
        )));
    }

    let parsed: KeyResponse = serde_json::from_str(body).map_err(|e| {
        warn!(error = %e, "Failed to parse balance response");
        CoreError::upstream(
            "Failed to parse API response. The service may be temporarily unavailable.",
        )
    })?;

    if let Some(error) = parsed.error {
        let message = error.into_message();
        warn!(%message, "OpenRouter API error");
        return Err(CoreError::upstream(format!("API error: {}", message)));
    }

    let data = parsed.data.ok_or_else(|| {
        warn!("No data field in API response");
        CoreError::upstream("API response missing data. Please try again.")
    })?;

    Ok(data.into())
}
