//! InfluxDB HTTP Client
//!
//! Talks to the InfluxDB 1.x `/query` endpoint: reads go out as `GET`,
//! statements that change server state as a form `POST`. Requests are made
//! once; a failed request is reported to the caller, never retried.

use crate::config::InfluxDbConfig;
use crate::context::executor::QueryExecutor;
use crate::series::Serie;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use thiserror::Error;

/// InfluxDB 1.x HTTP client
pub struct InfluxClient {
    client: Client,
    config: InfluxDbConfig,
}

impl InfluxClient {
    /// Create a new client from the connection settings
    pub fn new(config: InfluxDbConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self { client, config })
    }

    /// Get the current configuration
    pub fn config(&self) -> &InfluxDbConfig {
        &self.config
    }

    /// Check if the server answers `/ping`
    pub async fn ping(&self) -> ClientResult<()> {
        let url = format!("{}/ping", self.base_url());
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(map_send_error)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ClientError::Unavailable)
        }
    }

    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    fn query_url(&self) -> String {
        format!("{}/query", self.base_url())
    }

    fn authenticate(&self, request: RequestBuilder) -> RequestBuilder {
        if self.config.username.is_empty() {
            request
        } else {
            request.basic_auth(&self.config.username, Some(&self.config.password))
        }
    }

    async fn send(&self, request: RequestBuilder) -> ClientResult<Vec<Serie>> {
        let response = self
            .authenticate(request)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<QueryResponse>(&text)
                .ok()
                .and_then(|body| body.error)
                .unwrap_or(text);
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: QueryResponse = response.json().await.map_err(ClientError::Request)?;
        body.into_series()
    }
}

#[async_trait]
impl QueryExecutor for InfluxClient {
    async fn query(&self, database: &str, statement: &str) -> ClientResult<Vec<Serie>> {
        let mut params = vec![("q", statement)];
        if !database.is_empty() {
            params.push(("db", database));
        }
        let request = self.client.get(self.query_url()).query(&params);
        self.send(request).await
    }

    async fn command(&self, statement: &str) -> ClientResult<()> {
        let request = self.client.post(self.query_url()).form(&[("q", statement)]);
        self.send(request).await.map(|_| ())
    }
}

fn map_send_error(e: reqwest::Error) -> ClientError {
    if e.is_timeout() {
        ClientError::Timeout
    } else if e.is_connect() {
        ClientError::Unavailable
    } else {
        ClientError::Request(e)
    }
}

// ============================================
// Response DTOs
// ============================================

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatementResult {
    #[serde(default)]
    series: Vec<Serie>,
    #[serde(default)]
    error: Option<String>,
}

impl QueryResponse {
    /// All result sets in statement order, or the first reported error
    fn into_series(self) -> ClientResult<Vec<Serie>> {
        if let Some(error) = self.error {
            return Err(ClientError::Influx(error));
        }

        let mut series = Vec::new();
        for result in self.results {
            if let Some(error) = result.error {
                return Err(ClientError::Influx(error));
            }
            series.extend(result.series);
        }
        Ok(series)
    }
}

// ============================================
// Errors
// ============================================

/// Errors that can occur when communicating with InfluxDB
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("InfluxDB unavailable")]
    Unavailable,

    #[error("Request timeout")]
    Timeout,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("InfluxDB error: {0}")]
    Influx(String),
}

pub type ClientResult<T> = Result<T, ClientError>;
