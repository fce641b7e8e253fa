//! BigCommerce adapters.
//!
//! - [`ManagementClient`] talks to the REST Management API (promotions,
//!   coupon codes, storefront tokens) and backs [`BigCommercePromotionCatalog`].
//! - [`StorefrontClient`] talks to the Storefront GraphQL API and implements
//!   the cart ports.

mod management;
mod normalize;
mod storefront;
pub mod wire;

use serde::{Deserialize, Serialize};

use crate::error::CommerceError;

pub use management::{BigCommercePromotionCatalog, ManagementClient, MAX_PROMOTION_PAGES};
pub use normalize::{has_gift_rule, is_applicable, normalize_promotion, rule_applies, select_for_product};
pub use storefront::{StorefrontClient, StorefrontTokenSource};

/// Environment variable overriding the store hash.
pub const ENV_STORE_HASH: &str = "BIGCOMMERCE_STORE_HASH";
/// Environment variable overriding the Management API token.
pub const ENV_ACCESS_TOKEN: &str = "BIGCOMMERCE_ACCESS_TOKEN";
/// Environment variable overriding the channel.
pub const ENV_CHANNEL_ID: &str = "BIGCOMMERCE_CHANNEL_ID";

/// Default Management API host.
pub const DEFAULT_API_URL: &str = "https://api.bigcommerce.com";

/// Connection settings for one BigCommerce store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BigCommerceConfig {
    /// Store hash from the control panel URL.
    pub store_hash: String,
    /// Management API token (`X-Auth-Token`).
    pub access_token: String,
    /// Storefront channel.
    pub channel_id: u64,
    /// Management API host.
    pub api_url: String,
    /// Storefront GraphQL endpoint. Derived from the store hash when unset.
    pub storefront_url: Option<String>,
    /// Lifetime requested for minted storefront tokens.
    pub storefront_token_ttl_secs: i64,
}

impl Default for BigCommerceConfig {
    fn default() -> Self {
        Self {
            store_hash: String::new(),
            access_token: String::new(),
            channel_id: 1,
            api_url: DEFAULT_API_URL.to_string(),
            storefront_url: None,
            storefront_token_ttl_secs: 24 * 60 * 60,
        }
    }
}

impl BigCommerceConfig {
    /// Defaults overridden from the environment.
    pub fn from_env() -> Result<Self, CommerceError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Override fields from the environment where set.
    pub fn apply_env(&mut self) -> Result<(), CommerceError> {
        if let Ok(hash) = std::env::var(ENV_STORE_HASH) {
            self.store_hash = hash;
        }
        if let Ok(token) = std::env::var(ENV_ACCESS_TOKEN) {
            self.access_token = token;
        }
        if let Ok(channel) = std::env::var(ENV_CHANNEL_ID) {
            self.channel_id = channel.trim().parse().map_err(|_| {
                CommerceError::Config(format!("{} must be an integer, got {:?}", ENV_CHANNEL_ID, channel))
            })?;
        }
        Ok(())
    }

    /// Check that the settings can reach a store.
    pub fn validate(&self) -> Result<(), CommerceError> {
        if self.store_hash.trim().is_empty() {
            return Err(CommerceError::Config("store_hash is required".to_string()));
        }
        if self.access_token.trim().is_empty() {
            return Err(CommerceError::Config("access_token is required".to_string()));
        }
        if self.storefront_token_ttl_secs <= 60 {
            return Err(CommerceError::Config(
                "storefront_token_ttl_secs must exceed the 60s refresh margin".to_string(),
            ));
        }
        Ok(())
    }

    /// Base URL of the store's Management API.
    pub fn management_base_url(&self) -> String {
        format!("{}/stores/{}", self.api_url.trim_end_matches('/'), self.store_hash)
    }

    /// Storefront GraphQL endpoint.
    pub fn storefront_graphql_url(&self) -> String {
        match &self.storefront_url {
            Some(url) => url.clone(),
            None => format!("https://store-{}.mybigcommerce.com/graphql", self.store_hash),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> BigCommerceConfig {
        BigCommerceConfig {
            store_hash: "abc123".to_string(),
            access_token: "secret".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_urls() {
        let config = configured();
        assert_eq!(
            config.management_base_url(),
            "https://api.bigcommerce.com/stores/abc123"
        );
        assert_eq!(
            config.storefront_graphql_url(),
            "https://store-abc123.mybigcommerce.com/graphql"
        );

        let custom = BigCommerceConfig {
            storefront_url: Some("https://shop.example.com/graphql".to_string()),
            ..configured()
        };
        assert_eq!(custom.storefront_graphql_url(), "https://shop.example.com/graphql");
    }

    #[test]
    fn test_validate() {
        assert!(configured().validate().is_ok());
        assert!(BigCommerceConfig::default().validate().is_err());

        let short_ttl = BigCommerceConfig {
            storefront_token_ttl_secs: 30,
            ..configured()
        };
        assert!(short_ttl.validate().is_err());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: BigCommerceConfig = serde_json::from_str(r#"{"store_hash": "xyz"}"#).unwrap();
        assert_eq!(config.store_hash, "xyz");
        assert_eq!(config.channel_id, 1);
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }
}
