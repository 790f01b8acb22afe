//! Outbound calls to the REST data API and the purchase webhook.
//!
//! Handlers only see the [`DataApi`] and [`WebhookSink`] traits, so tests can
//! swap in in-memory doubles for the reqwest-backed clients.

use async_trait::async_trait;
use purchase::WebhookPayload;
use reqwest::header::{HeaderMap, AUTHORIZATION, CONTENT_RANGE, CONTENT_TYPE};
use reqwest::Client;
use search::IndexRange;
use serde_json::Value;
use std::time::Duration;

/// Failure of one outbound call.
///
/// `Display` carries upstream detail, so it is for logs only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RestError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl RestError {
    fn transport(err: reqwest::Error) -> Self {
        RestError::Transport(err.to_string())
    }
}

/// A row-listing request against one table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowQuery {
    pub table: String,
    pub params: Vec<(String, String)>,
    pub range: Option<IndexRange>,
    /// Ask for `Prefer: count=exact`
    pub count: bool,
}

impl RowQuery {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn with_range(mut self, range: Option<IndexRange>) -> Self {
        self.range = range;
        self
    }

    pub fn with_count(mut self) -> Self {
        self.count = true;
        self
    }
}

/// Rows plus the pagination header the data API sent with them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowPage {
    pub rows: Vec<Value>,
    pub content_range: Option<String>,
}

#[async_trait]
pub trait DataApi: Send + Sync {
    async fn list_rows(&self, query: &RowQuery) -> Result<RowPage, RestError>;

    /// Insert one row with `Prefer: return=minimal`.
    async fn insert_row(&self, table: &str, row: &Value) -> Result<(), RestError>;

    async fn call_rpc(&self, function: &str, args: &Value) -> Result<Value, RestError>;
}

/// PostgREST client authenticating with the service key.
#[derive(Clone)]
pub struct PostgrestClient {
    client: Client,
    base: String,
    api_key: String,
}

impl PostgrestClient {
    /// `base` is the `/rest/v1` root.
    pub fn new(
        base: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RestError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(RestError::transport)?;
        Ok(Self {
            client,
            base: base.into(),
            api_key: api_key.into(),
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}/{}", self.base, path))
            .header("apikey", &self.api_key)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, RestError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(RestError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

impl std::fmt::Debug for PostgrestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgrestClient")
            .field("base", &self.base)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl DataApi for PostgrestClient {
    async fn list_rows(&self, query: &RowQuery) -> Result<RowPage, RestError> {
        let mut request = self
            .request(reqwest::Method::GET, &query.table)
            .query(&query.params);
        if query.count {
            request = request.header("Prefer", "count=exact");
        }
        if let Some(range) = query.range {
            request = request.header("Range", range.to_string());
        }

        let response = Self::check(request.send().await.map_err(RestError::transport)?).await?;
        let content_range = header_text(response.headers(), CONTENT_RANGE.as_str());
        let rows = response
            .json::<Vec<Value>>()
            .await
            .map_err(|err| RestError::Decode(err.to_string()))?;
        Ok(RowPage {
            rows,
            content_range,
        })
    }

    async fn insert_row(&self, table: &str, row: &Value) -> Result<(), RestError> {
        let request = self
            .request(reqwest::Method::POST, table)
            .header("Prefer", "return=minimal")
            .json(row);
        Self::check(request.send().await.map_err(RestError::transport)?).await?;
        Ok(())
    }

    async fn call_rpc(&self, function: &str, args: &Value) -> Result<Value, RestError> {
        let request = self
            .request(reqwest::Method::POST, &format!("rpc/{function}"))
            .json(args);
        let response = Self::check(request.send().await.map_err(RestError::transport)?).await?;
        let text = response.text().await.map_err(RestError::transport)?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|err| RestError::Decode(err.to_string()))
    }
}

/// Raw reply from the purchase webhook, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookReply {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

#[async_trait]
pub trait WebhookSink: Send + Sync {
    /// Only transport failures are errors; any HTTP status is a reply.
    async fn deliver(&self, payload: &WebhookPayload) -> Result<WebhookReply, RestError>;
}

/// Posts purchase payloads as JSON to a fixed URL.
#[derive(Debug, Clone)]
pub struct HttpWebhook {
    client: Client,
    url: String,
}

impl HttpWebhook {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, RestError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(RestError::transport)?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl WebhookSink for HttpWebhook {
    async fn deliver(&self, payload: &WebhookPayload) -> Result<WebhookReply, RestError> {
        let response = self
            .client
            .post(&self.url)
            .json(payload)
            .send()
            .await
            .map_err(RestError::transport)?;
        let status = response.status().as_u16();
        let content_type = header_text(response.headers(), CONTENT_TYPE.as_str());
        let body = response.text().await.map_err(RestError::transport)?;
        Ok(WebhookReply {
            status,
            content_type,
            body,
        })
    }
}

fn header_text(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}
