//! HTTP client for the slot journal API.
//!
//! Build one through [`crate::config::JournalConfig::client`], which reads
//! `SLOT_JOURNAL_URL` (default: `http://localhost:3000/api/v1`) and
//! `SLOT_JOURNAL_API_KEY`.

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::calendar::MonthView;
use crate::models::*;
use crate::save::{SlotTransport, TransportError};

/// Default URL for local development.
pub const DEFAULT_URL: &str = "http://localhost:3000/api/v1";

/// HTTP client errors.
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

impl From<ClientError> for TransportError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Http(e) => TransportError::Unavailable(e.to_string()),
            ClientError::NotFound(message) => TransportError::Rejected {
                status: StatusCode::NOT_FOUND.as_u16(),
                message,
            },
            ClientError::BadRequest(message) => TransportError::Rejected {
                status: StatusCode::BAD_REQUEST.as_u16(),
                message,
            },
            ClientError::Unauthorized => TransportError::Rejected {
                status: StatusCode::UNAUTHORIZED.as_u16(),
                message: "API key required or invalid".to_string(),
            },
            ClientError::Server(message) => TransportError::Rejected {
                status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                message,
            },
        }
    }
}

/// Server health as reported by `/health`.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

/// Where and how a day's slots are saved.
///
/// Passed to [`HttpTransport`] at construction instead of being looked up
/// from ambient state at save time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveConfig {
    /// Full URL of the day's save endpoint.
    pub endpoint: String,
    /// Bearer token sent with every save.
    pub token: Option<String>,
}

/// HTTP client for the slot journal API.
#[derive(Debug, Clone)]
pub struct JournalClient {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl JournalClient {
    /// Create with explicit configuration.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a request with optional auth header.
    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.request(method, &url);
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key);
        }
        req
    }

    // ============================================================
    // Health
    // ============================================================

    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        let response = self.request(reqwest::Method::GET, "/health").send().await?;
        handle_response(response).await
    }

    // ============================================================
    // Concepts
    // ============================================================

    /// List active concepts ordered by name.
    pub async fn list_concepts(&self) -> Result<Vec<Concept>, ClientError> {
        let response = self.request(reqwest::Method::GET, "/concepts").send().await?;
        handle_response(response).await
    }

    pub async fn create_concept(&self, input: &CreateConceptInput) -> Result<Concept, ClientError> {
        let response = self
            .request(reqwest::Method::POST, "/concepts")
            .json(input)
            .send()
            .await?;
        handle_response(response).await
    }

    // ============================================================
    // Days
    // ============================================================

    /// Get the month calendar.
    pub async fn get_calendar(&self, year: i32, month: u32) -> Result<MonthView, ClientError> {
        let response = self
            .request(
                reqwest::Method::GET,
                &format!("/calendar?year={}&month={}", year, month),
            )
            .send()
            .await?;
        handle_response(response).await
    }

    /// Get everything needed to render a day, creating its journal if needed.
    pub async fn get_day(&self, date: NaiveDate) -> Result<DayView, ClientError> {
        let response = self
            .request(reqwest::Method::GET, &day_path(date))
            .send()
            .await?;
        handle_response(response).await
    }

    pub async fn update_journal(
        &self,
        date: NaiveDate,
        input: &UpdateDayJournalInput,
    ) -> Result<DayJournal, ClientError> {
        let response = self
            .request(reqwest::Method::PUT, &day_path(date))
            .json(input)
            .send()
            .await?;
        handle_response(response).await
    }

    /// Replace all slot items of a day.
    pub async fn save_slots(
        &self,
        date: NaiveDate,
        payload: &SlotsPayload,
    ) -> Result<SaveSlotsResponse, ClientError> {
        let response = self
            .request(reqwest::Method::POST, &format!("{}/slots", day_path(date)))
            .json(payload)
            .send()
            .await?;
        handle_response(response).await
    }

    /// Save configuration for one day's slots.
    pub fn save_config(&self, date: NaiveDate) -> SaveConfig {
        SaveConfig {
            endpoint: format!("{}{}/slots", self.base_url, day_path(date)),
            token: self.api_key.clone(),
        }
    }

    /// A transport that saves into `date`, sharing this client's connection pool.
    pub fn day_transport(&self, date: NaiveDate) -> HttpTransport {
        HttpTransport::with_client(self.save_config(date), self.client.clone())
    }
}

/// Persistence transport posting payloads to a configured endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    config: SaveConfig,
    client: Client,
}

impl HttpTransport {
    pub fn new(config: SaveConfig) -> Self {
        Self::with_client(config, Client::new())
    }

    pub fn with_client(config: SaveConfig, client: Client) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &SaveConfig {
        &self.config
    }
}

#[async_trait]
impl SlotTransport for HttpTransport {
    async fn submit(&self, payload: &SlotsPayload) -> Result<(), TransportError> {
        let mut req = self.client.post(&self.config.endpoint).json(payload);
        if let Some(ref token) = self.config.token {
            req = req.bearer_auth(token);
        }
        let response = req.send().await.map_err(ClientError::from)?;
        let ack: SaveSlotsResponse = handle_response(response).await?;
        if ack.ok {
            Ok(())
        } else {
            Err(TransportError::Rejected {
                status: StatusCode::OK.as_u16(),
                message: "server did not acknowledge the save".to_string(),
            })
        }
    }
}

fn day_path(date: NaiveDate) -> String {
    format!("/days/{}/{}/{}", date.year(), date.month(), date.day())
}

/// Handle response, converting HTTP errors to ClientError.
async fn handle_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        Ok(response.json().await?)
    } else {
        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::NOT_FOUND => Err(ClientError::NotFound(body)),
            StatusCode::BAD_REQUEST => Err(ClientError::BadRequest(body)),
            StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
            _ => Err(ClientError::Server(format!("{}: {}", status, body))),
        }
    }
}
