//! Dependency tagging for outbound platform calls.

use std::time::Duration;

use crate::retry::RetryPolicy;
use crate::timeout::TimeoutConfig;

/// Categories of outbound calls the storefront makes.
///
/// Each tag carries a default timeout and retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyTag {
    /// Promotion catalog listing.
    Promotions,
    /// Coupon codes of a single promotion.
    PromotionCodes,
    /// Cart reads.
    Cart,
    /// Cart mutations (add, remove, coupon).
    CartMutation,
    /// Short-lived credential issuance.
    Credentials,
    /// Custom dependency with name.
    Custom(&'static str),
}

impl DependencyTag {
    /// Get the default timeout for this dependency type.
    pub fn default_timeout(&self) -> Duration {
        match self {
            Self::Promotions => Duration::from_millis(2500),
            Self::PromotionCodes => Duration::from_millis(1500),
            Self::Cart => Duration::from_millis(2000),
            Self::CartMutation => Duration::from_millis(3000),
            Self::Credentials => Duration::from_millis(2000),
            Self::Custom(_) => Duration::from_millis(2000),
        }
    }

    /// Get the default max retries for this dependency type.
    pub fn default_max_retries(&self) -> u32 {
        match self {
            Self::Promotions | Self::Cart | Self::Credentials => 2,
            // A lost response to a mutation is ambiguous; never replay it.
            Self::CartMutation => 0,
            _ => 1,
        }
    }

    /// Get the tag name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Promotions => "promotions",
            Self::PromotionCodes => "promotion_codes",
            Self::Cart => "cart",
            Self::CartMutation => "cart_mutation",
            Self::Credentials => "credentials",
            Self::Custom(name) => name,
        }
    }
}

impl std::fmt::Display for DependencyTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Fetch policy combining timeout and retry configuration.
#[derive(Debug, Clone, Default)]
pub struct FetchPolicy {
    /// Timeout configuration.
    pub timeout: TimeoutConfig,
    /// Retry policy.
    pub retry: RetryPolicy,
}

impl FetchPolicy {
    /// Create a new fetch policy.
    pub fn new(timeout: TimeoutConfig, retry: RetryPolicy) -> Self {
        Self { timeout, retry }
    }

    /// Create from a dependency tag's defaults.
    pub fn from_tag(tag: DependencyTag) -> Self {
        let retry = match tag.default_max_retries() {
            0 => RetryPolicy::none(),
            n => RetryPolicy::new(n),
        };
        Self {
            timeout: TimeoutConfig::from_total(tag.default_timeout()),
            retry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutations_are_not_retried() {
        let policy = FetchPolicy::from_tag(DependencyTag::CartMutation);
        assert_eq!(policy.retry.max_retries, 0);
        let unavailable = crate::Response::new(503, Default::default(), Vec::new());
        assert_eq!(policy.retry.retry_response(&unavailable, 0), None);
    }

    #[test]
    fn test_reads_are_retried() {
        let policy = FetchPolicy::from_tag(DependencyTag::Promotions);
        assert_eq!(policy.retry.max_retries, 2);
        assert_eq!(policy.timeout.total, Duration::from_millis(2500));
    }

    #[test]
    fn test_tag_names() {
        assert_eq!(DependencyTag::PromotionCodes.to_string(), "promotion_codes");
        assert_eq!(DependencyTag::Custom("ors").name(), "ors");
    }
}
