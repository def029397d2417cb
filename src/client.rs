//! Blocking HTTP client for the per-user reading feed.
//!
//! - `ureq` agent with a global timeout; redirects (Apps Script) are followed.
//! - Feeds answer either a bare JSON array of reading objects or
//!   `{ "success": true, "data": [...] }`. Anything else is a format error.
//! - An empty array is its own error so callers can say "no data" instead
//!   of blaming the network.
//! - Bodies are read up to a configurable cap; larger ones are `TooLarge`.

use http::StatusCode;
use log::debug;
use serde_json::Value;
use std::time::Duration;

use crate::models::reading::Reading;
use crate::timestamp::TimestampFormat;

#[derive(Debug)]
pub enum FeedError {
    Transport(String),
    Http { status: StatusCode, message: String },
    InvalidFormat(String),
    TooLarge { limit: u64 },
    NoData,
}

impl FeedError {
    /// Message shown to the person looking at the view.
    pub fn user_message(&self) -> &'static str {
        match self {
            FeedError::Transport(_) | FeedError::Http { .. } => "Could not reach the data feed",
            FeedError::InvalidFormat(_) => "The data feed has an invalid format",
            FeedError::TooLarge { .. } => "The data feed is too large to load",
            FeedError::NoData => "No data",
        }
    }
}

impl core::fmt::Display for FeedError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FeedError::Transport(s) => write!(f, "transport error: {}", s),
            FeedError::Http { status, message } => write!(f, "http {}: {}", status, message),
            FeedError::InvalidFormat(s) => write!(f, "invalid feed format: {}", s),
            FeedError::TooLarge { limit } => write!(f, "feed body exceeds {} bytes", limit),
            FeedError::NoData => write!(f, "feed returned no readings"),
        }
    }
}

impl std::error::Error for FeedError {}

/// Where a user's readings come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedTarget {
    pub url: String,
    pub ai_url: Option<String>,
    pub format: TimestampFormat,
}

/// Anything that can produce a reading list for a feed URL.
pub trait FeedSource: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> Result<Vec<Reading>, FeedError>;
}

/// Decode a feed body into readings.
pub fn decode_feed(body: &str) -> Result<Vec<Reading>, FeedError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| FeedError::InvalidFormat(format!("body is not JSON: {}", e)))?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut envelope) => {
            let success = matches!(envelope.get("success"), Some(Value::Bool(true)));
            match (success, envelope.remove("data")) {
                (true, Some(Value::Array(items))) => items,
                _ => {
                    return Err(FeedError::InvalidFormat(
                        "expected an array or {\"success\": true, \"data\": [...]}".to_string(),
                    ));
                }
            }
        }
        other => {
            return Err(FeedError::InvalidFormat(format!(
                "expected an array or object, got {}",
                json_kind(&other)
            )));
        }
    };

    if items.is_empty() {
        return Err(FeedError::NoData);
    }

    serde_path_to_error::deserialize(Value::Array(items))
        .map_err(|e| FeedError::InvalidFormat(format!("{} at {}", e.inner(), e.path())))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

pub struct FeedClient {
    agent: ureq::Agent,
    max_body_bytes: u64,
}

impl FeedClient {
    pub fn new(timeout: Duration, max_body_bytes: u64) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        FeedClient { agent, max_body_bytes }
    }

    fn get_body(&self, url: &str) -> Result<String, FeedError> {
        let mut response = self
            .agent
            .get(url)
            .header("Accept", "application/json")
            .call()
            .map_err(|e| FeedError::Transport(e.to_string()))?;

        let status: StatusCode = response.status();
        let body = response
            .body_mut()
            .with_config()
            .limit(self.max_body_bytes)
            .read_to_string()
            .map_err(|e| match e {
                ureq::Error::BodyExceedsLimit(limit) => FeedError::TooLarge { limit },
                other => FeedError::Transport(other.to_string()),
            })?;
        debug!("Feed: GET {} -> {} ({} bytes)", url, status, body.len());

        if !status.is_success() {
            return Err(FeedError::Http { status, message: body });
        }
        Ok(body)
    }
}

impl FeedSource for FeedClient {
    fn fetch(&self, url: &str) -> Result<Vec<Reading>, FeedError> {
        decode_feed(&self.get_body(url)?)
    }
}
