//! Platform responses, read in full before they are inspected.

use std::collections::HashMap;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::FetchError;

/// Milliseconds until a BigCommerce store's request quota refills.
const RATE_LIMIT_RESET_HEADER: &str = "x-rate-limit-time-reset-ms";

/// A response with its body read. Header names are lower-cased.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

/// Error envelope of the v3 REST API.
#[derive(Deserialize)]
struct ErrorBody {
    title: Option<String>,
    detail: Option<String>,
}

impl Response {
    pub fn new(status: u16, headers: HashMap<String, String>, body: Vec<u8>) -> Self {
        let headers = headers
            .into_iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v))
            .collect();
        Self {
            status,
            headers,
            body,
        }
    }

    /// Drain a reqwest response.
    pub(crate) async fn read(resp: reqwest::Response) -> Result<Self, FetchError> {
        let status = resp.status().as_u16();
        let headers = resp
            .headers()
            .iter()
            .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
            .collect();
        let body = resp.bytes().await?.to_vec();
        Ok(Self::new(status, headers, body))
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// How long until the rate-limit window resets, when the platform said.
    pub fn rate_limit_reset(&self) -> Option<Duration> {
        self.header(RATE_LIMIT_RESET_HEADER)?
            .trim()
            .parse()
            .ok()
            .map(Duration::from_millis)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, FetchError> {
        serde_json::from_slice(&self.body).map_err(|e| FetchError::ParseError(e.to_string()))
    }

    /// Human-readable failure reason: the API's `title`/`detail` when the
    /// body is a v3 error, the raw body otherwise.
    pub fn error_message(&self) -> String {
        if let Ok(ErrorBody { title, detail }) = serde_json::from_slice::<ErrorBody>(&self.body) {
            match (title, detail) {
                (Some(t), Some(d)) => return format!("{t}: {d}"),
                (Some(m), None) | (None, Some(m)) => return m,
                (None, None) => {}
            }
        }
        String::from_utf8_lossy(&self.body).trim().to_string()
    }

    /// Turn a non-2xx status into [`FetchError::HttpError`].
    pub fn error_for_status(self) -> Result<Self, FetchError> {
        if self.is_success() {
            return Ok(self);
        }
        Err(FetchError::HttpError {
            status: self.status,
            message: self.error_message(),
        })
    }
}
