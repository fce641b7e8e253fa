//! Identifier newtypes.
//!
//! Catalog entities (products, variants, promotions) carry the platform's
//! integer entity IDs. Cart-scoped IDs are opaque strings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to generate integer entity ID structs.
macro_rules! define_entity_id {
    ($name:ident) => {
        /// A platform-assigned integer identifier.
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Create a new ID from its integer value.
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// Get the integer value.
            pub const fn get(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }
    };
}

/// Cart-scoped references. The storefront API hands these out as UUID
/// strings; they are compared and echoed back, never parsed.
macro_rules! define_cart_ref {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }
    };
}

define_entity_id!(ProductId);
define_entity_id!(VariantId);
define_entity_id!(PromotionId);

define_cart_ref!(CartId);
define_cart_ref!(LineItemId);

/// Identity of a gift: a product, optionally pinned to one variant.
///
/// `variant_id: None` means "any variant" (a product-level gift). Displays
/// as `{product}-{variant}` with `none` standing in for an absent variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GiftKey {
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
}

impl GiftKey {
    /// Create a gift key.
    pub fn new(product_id: ProductId, variant_id: Option<VariantId>) -> Self {
        Self {
            product_id,
            variant_id,
        }
    }
}

impl fmt::Display for GiftKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.variant_id {
            Some(variant) => write!(f, "{}-{}", self.product_id, variant),
            None => write!(f, "{}-none", self.product_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_creation() {
        let id = ProductId::new(111);
        assert_eq!(id.get(), 111);
        assert_eq!(id.to_string(), "111");
    }

    #[test]
    fn test_entity_id_parse() {
        let id: ProductId = " 42 ".parse().unwrap();
        assert_eq!(id, ProductId::new(42));
        assert!("abc".parse::<ProductId>().is_err());
    }

    #[test]
    fn test_entity_id_serde_transparent() {
        let id: PromotionId = serde_json::from_str("7").unwrap();
        assert_eq!(id, PromotionId::new(7));
        assert_eq!(serde_json::to_string(&id).unwrap(), "7");
    }

    #[test]
    fn test_string_id_from_str() {
        let id: LineItemId = "5f3c-9a".into();
        assert_eq!(id.as_str(), "5f3c-9a");
        assert_eq!(format!("{}", id), "5f3c-9a");
    }

    #[test]
    fn test_gift_key_display() {
        let with_variant = GiftKey::new(ProductId::new(200), Some(VariantId::new(7)));
        let any_variant = GiftKey::new(ProductId::new(200), None);
        assert_eq!(with_variant.to_string(), "200-7");
        assert_eq!(any_variant.to_string(), "200-none");
        assert_ne!(with_variant, any_variant);
    }
}
