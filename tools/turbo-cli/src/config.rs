//! CLI configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use turbo_commerce::bigcommerce::BigCommerceConfig;
use turbo_commerce::reconcile::ReconcilerConfig;
use turbo_observability::LogConfig;

/// Config file names searched from the working directory upwards.
pub const CONFIG_FILE_NAMES: [&str; 3] = ["turbo.toml", ".turbo.toml", "turbo.json"];

/// CLI configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurboConfig {
    /// Store connection.
    #[serde(default)]
    pub bigcommerce: BigCommerceConfig,

    /// Reconciliation settings.
    #[serde(default)]
    pub reconciler: ReconcilerConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LogConfig,
}

impl TurboConfig {
    /// Load config from a file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        Self::parse(path, &content)
    }

    /// Parse config text, choosing the format from the file extension.
    pub fn parse(path: &str, content: &str) -> Result<Self> {
        if path.ends_with(".json") {
            serde_json::from_str(content)
                .with_context(|| format!("Failed to parse JSON config: {}", path))
        } else {
            toml::from_str(content)
                .with_context(|| format!("Failed to parse TOML config: {}", path))
        }
    }

    /// Apply `BIGCOMMERCE_*` environment overrides.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        self.bigcommerce.apply_env()?;
        Ok(self)
    }

    /// Copy safe to print, with the access token masked.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        config.bigcommerce.access_token = mask_secret(&config.bigcommerce.access_token);
        config
    }
}

/// Mask all but the last four characters of a secret.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), visible)
}

/// Generate a default turbo.toml config file.
pub fn generate_default_config(store_hash: &str) -> String {
    format!(
        r#"# TurboCommerce gift promotion configuration

[bigcommerce]
store_hash = "{store_hash}"
# Prefer the BIGCOMMERCE_ACCESS_TOKEN environment variable for the token.
access_token = ""
channel_id = 1
# storefront_url = "https://store-{store_hash}.mybigcommerce.com/graphql"
storefront_token_ttl_secs = 86400

[reconciler]
# Bound on each cart load, promotion lookup, and removal (milliseconds).
call_timeout = 5000

[logging]
level = "info"
format = "human"
# directives = ["turbo_data=debug"]
"#,
        store_hash = store_hash
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use turbo_observability::{LogFormat, LogLevel};

    #[test]
    fn test_generated_config_parses() {
        let config = TurboConfig::parse("turbo.toml", &generate_default_config("abc123")).unwrap();
        assert_eq!(config.bigcommerce.store_hash, "abc123");
        assert_eq!(config.bigcommerce.channel_id, 1);
        assert_eq!(config.reconciler.call_timeout, Duration::from_millis(5000));
        assert_eq!(config.logging.level, LogLevel::Info);
        assert_eq!(config.logging.format, LogFormat::Human);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = TurboConfig::parse("turbo.toml", "").unwrap();
        assert_eq!(config, TurboConfig::default());

        let config = TurboConfig::parse("turbo.json", "{}").unwrap();
        assert_eq!(config, TurboConfig::default());
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("abcdefgh"), "****efgh");
        assert_eq!(mask_secret("abc"), "***");
        assert_eq!(mask_secret(""), "");
    }

    #[test]
    fn test_redacted_hides_token() {
        let mut config = TurboConfig::default();
        config.bigcommerce.access_token = "supersecret".to_string();
        assert_eq!(config.redacted().bigcommerce.access_token, "*******cret");
    }
}
