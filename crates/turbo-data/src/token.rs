//! Short-lived credential cache.
//!
//! Platform tokens (storefront API tokens, OAuth client-credential tokens)
//! are minted on demand and reused until shortly before they expire. The
//! cache is an explicit value owned by whoever needs the credential; there is
//! no process-global token.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::debug;

use crate::FetchError;

/// Default margin before expiry at which a token is considered stale.
pub const DEFAULT_REFRESH_MARGIN_SECS: i64 = 60;

/// A token together with its absolute expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// The bearer value.
    pub value: String,
    /// When the issuer stops honouring the token.
    pub expires_at: DateTime<Utc>,
}

impl IssuedToken {
    /// Create a token expiring at the given instant.
    pub fn new(value: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            expires_at,
        }
    }

    /// Whether the token is still usable at `now`, keeping `margin` in reserve.
    pub fn is_fresh(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        self.expires_at - margin > now
    }
}

/// Something that can mint a new token.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Issue a fresh token.
    async fn issue(&self) -> Result<IssuedToken, FetchError>;
}

/// Memoizing wrapper around a [`TokenSource`].
///
/// Refreshes are serialized behind an async mutex, so concurrent callers
/// that find the token stale wait for a single issuance instead of minting
/// one each.
pub struct TokenCache<S> {
    source: S,
    refresh_margin: Duration,
    cached: Mutex<Option<IssuedToken>>,
}

impl<S: TokenSource> TokenCache<S> {
    /// Create an empty cache over a token source.
    pub fn new(source: S) -> Self {
        Self {
            source,
            refresh_margin: Duration::seconds(DEFAULT_REFRESH_MARGIN_SECS),
            cached: Mutex::new(None),
        }
    }

    /// Return a usable token, issuing a new one if needed.
    pub async fn acquire(&self) -> Result<String, FetchError> {
        self.acquire_at(Utc::now()).await
    }

    async fn acquire_at(&self, now: DateTime<Utc>) -> Result<String, FetchError> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if token.is_fresh(now, self.refresh_margin) {
                return Ok(token.value.clone());
            }
        }

        let token = self.source.issue().await?;
        debug!(expires_at = %token.expires_at, "issued new platform token");
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    /// Drop the cached token, e.g. after the platform rejected it.
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }
}
