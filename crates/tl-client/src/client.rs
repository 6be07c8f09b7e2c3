//! HTTP client for the remote time log store.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Method, Request, Url};
use serde::Deserialize;
use thiserror::Error;
use tl_core::{EntryDraft, EntryId, LogEntry};

use crate::store::EntryStore;

/// Default request timeout for store calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Range bounds are sent without an offset, in UTC.
const QUERY_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Remote store errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The provided bearer token was invalid.
    #[error("invalid token: {reason}")]
    InvalidToken { reason: &'static str },
    /// The store base URL could not be parsed.
    #[error("invalid store URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The store answered with a non-success status.
    #[error("store error ({status}): {message}")]
    Api { status: u16, message: String },
    /// Failed to parse response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Client for the `/timelogs` resource of the remote store.
///
/// Every request carries the token as a bearer credential.
///
/// # Thread Safety
///
/// The client is safe to clone and share across threads. Each clone shares
/// the underlying HTTP connection pool.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
    token: String,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url.as_str())
            .field("token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a client for the store at `base_url` (for example
    /// `http://localhost:8000/api`).
    ///
    /// # Errors
    ///
    /// Returns an error if the token is empty or whitespace-only, if the URL
    /// is not an absolute http(s) URL, or if the HTTP client fails to build.
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self, ClientError> {
        let token = token.into();

        if token.is_empty() {
            return Err(ClientError::InvalidToken {
                reason: "token cannot be empty",
            });
        }
        if token.trim().is_empty() {
            return Err(ClientError::InvalidToken {
                reason: "token cannot be whitespace-only",
            });
        }

        let base_url = parse_base_url(base_url)?;

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(ClientError::ClientBuild)?;

        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Downloads every entry of the user as CSV.
    pub async fn export_csv(&self) -> Result<String, ClientError> {
        let request = self.request(Method::GET, &["timelogs", "export"]).build()?;
        self.send(request).await
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> reqwest::RequestBuilder {
        self.http
            .request(method, self.endpoint(segments))
            .bearer_auth(&self.token)
    }

    fn list_request(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Request, ClientError> {
        let start = start.format(QUERY_TIME_FORMAT).to_string();
        let end = end.format(QUERY_TIME_FORMAT).to_string();
        Ok(self
            .request(Method::GET, &["timelogs"])
            .query(&[("start_date", start), ("end_date", end)])
            .build()?)
    }

    fn create_request(&self, draft: &EntryDraft) -> Result<Request, ClientError> {
        Ok(self.request(Method::POST, &["timelogs"]).json(draft).build()?)
    }

    fn update_request(&self, id: &EntryId, draft: &EntryDraft) -> Result<Request, ClientError> {
        Ok(self
            .request(Method::PUT, &["timelogs"])
            .query(&[("uuid", id.as_str())])
            .json(draft)
            .build()?)
    }

    fn delete_request(&self, id: &EntryId) -> Result<Request, ClientError> {
        Ok(self
            .request(Method::DELETE, &["timelogs"])
            .query(&[("uuid", id.as_str())])
            .build()?)
    }

    async fn send(&self, request: Request) -> Result<String, ClientError> {
        let method = request.method().clone();
        let path = request.url().path().to_string();
        tracing::debug!(%method, path, "sending store request");

        let response = self.http.execute(request).await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::debug!(%method, path, status = status.as_u16(), "store request failed");
            return Err(parse_api_error(status.as_u16(), &body).unwrap_or_else(|| {
                ClientError::Api {
                    status: status.as_u16(),
                    message: fallback_message(status, &body),
                }
            }));
        }
        Ok(body)
    }
}

impl EntryStore for Client {
    async fn list_entries(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<LogEntry>, ClientError> {
        let request = self.list_request(start, end)?;
        let body = self.send(request).await?;
        let entries = parse_entries(&body)?;
        tracing::debug!(count = entries.len(), %start, %end, "fetched entries");
        Ok(entries)
    }

    async fn create_entry(&self, draft: &EntryDraft) -> Result<EntryId, ClientError> {
        let request = self.create_request(draft)?;
        let body = self.send(request).await?;
        parse_created_id(&body)
    }

    async fn update_entry(&self, id: &EntryId, draft: &EntryDraft) -> Result<(), ClientError> {
        let request = self.update_request(id, draft)?;
        self.send(request).await?;
        Ok(())
    }

    async fn delete_entry(&self, id: &EntryId) -> Result<(), ClientError> {
        let request = self.delete_request(id)?;
        self.send(request).await?;
        Ok(())
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ClientError> {
    let invalid = |reason: String| ClientError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw.trim()).map_err(|err| invalid(err.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {}", url.scheme())));
    }
    if url.cannot_be_a_base() {
        return Err(invalid("URL cannot be a base".to_string()));
    }
    Ok(url)
}

fn parse_entries(body: &str) -> Result<Vec<LogEntry>, ClientError> {
    serde_json::from_str(body).map_err(|err| ClientError::InvalidResponse(err.to_string()))
}

fn parse_created_id(body: &str) -> Result<EntryId, ClientError> {
    #[derive(Deserialize)]
    struct Created {
        id: String,
    }

    let created: Created =
        serde_json::from_str(body).map_err(|err| ClientError::InvalidResponse(err.to_string()))?;
    EntryId::new(created.id).map_err(|err| ClientError::InvalidResponse(err.to_string()))
}

/// Reads a `{"detail": ...}` error body. Validation failures carry a list
/// of problems instead of a string; those are kept as compact JSON.
fn parse_api_error(status: u16, body: &str) -> Option<ClientError> {
    #[derive(Deserialize)]
    struct ErrorPayload {
        detail: serde_json::Value,
    }

    let payload: ErrorPayload = serde_json::from_str(body).ok()?;
    let message = match payload.detail {
        serde_json::Value::String(text) => text,
        other => other.to_string(),
    };
    Some(ClientError::Api { status, message })
}

fn fallback_message(status: reqwest::StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown status")
            .to_string()
    } else {
        body.to_string()
    }
}
