//! BigCommerce payload schemas.
//!
//! Strict types for the parts of each payload this crate reads. Unknown
//! fields are ignored; missing required fields and unknown enum values fail
//! deserialization.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Management API v3: promotions
// ---------------------------------------------------------------------------

/// `GET /v3/promotions` response page.
#[derive(Debug, Clone, Deserialize)]
pub struct PromotionsPage {
    pub data: Vec<PromotionRecord>,
    #[serde(default)]
    pub meta: Option<PageMeta>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageMeta {
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PromotionStatus {
    Enabled,
    Disabled,
    Expired,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PromotionRecord {
    pub id: u64,
    pub name: String,
    pub status: PromotionStatus,
    #[serde(default)]
    pub redemption_type: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    pub rules: Vec<PromotionRule>,
}

impl PromotionRecord {
    /// Check if redemption requires a coupon code.
    pub fn is_coupon(&self) -> bool {
        self.redemption_type.as_deref() == Some("COUPON")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PromotionRule {
    #[serde(default)]
    pub action: Option<RuleAction>,
    #[serde(default)]
    pub apply_once: Option<bool>,
    #[serde(default)]
    pub condition: Option<RuleCondition>,
}

impl PromotionRule {
    /// The gift this rule grants, if any.
    pub fn gift_item(&self) -> Option<&WireGiftItem> {
        self.action.as_ref()?.gift_item.as_ref()
    }

    /// Products listed in the cart condition. Empty when there is none.
    pub fn condition_products(&self) -> &[u64] {
        self.cart_condition()
            .and_then(|cart| cart.items.as_ref())
            .and_then(|items| items.products.as_deref())
            .unwrap_or(&[])
    }

    /// Minimum cart quantity from the cart condition.
    pub fn minimum_quantity(&self) -> Option<u32> {
        self.cart_condition()?.minimum_quantity
    }

    fn cart_condition(&self) -> Option<&CartCondition> {
        self.condition.as_ref()?.cart.as_ref()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleAction {
    #[serde(default)]
    pub gift_item: Option<WireGiftItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireGiftItem {
    #[serde(default)]
    pub product_id: Option<u64>,
    #[serde(default)]
    pub variant_id: Option<u64>,
    pub quantity: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleCondition {
    #[serde(default)]
    pub cart: Option<CartCondition>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CartCondition {
    #[serde(default)]
    pub items: Option<ItemsCondition>,
    #[serde(default)]
    pub minimum_quantity: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemsCondition {
    #[serde(default)]
    pub products: Option<Vec<u64>>,
}

/// `GET /v3/promotions/{id}/codes` response.
#[derive(Debug, Clone, Deserialize)]
pub struct CouponCodesPage {
    pub data: Vec<CouponCode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CouponCode {
    pub id: u64,
    pub code: String,
    pub current_uses: u64,
    pub max_uses: u64,
}

// ---------------------------------------------------------------------------
// Management API v3: storefront tokens
// ---------------------------------------------------------------------------

/// `POST /v3/storefront/api-token` request body.
#[derive(Debug, Clone, Serialize)]
pub struct StorefrontTokenRequest {
    pub channel_id: u64,
    /// Unix seconds.
    pub expires_at: i64,
    pub allowed_cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorefrontTokenResponse {
    pub data: StorefrontTokenData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorefrontTokenData {
    pub token: String,
}

// ---------------------------------------------------------------------------
// Storefront GraphQL
// ---------------------------------------------------------------------------

/// GraphQL request envelope.
#[derive(Debug, Clone, Serialize)]
pub struct GraphQlRequest<'a, V: Serialize> {
    pub query: &'a str,
    pub variables: V,
}

/// GraphQL response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CartQueryData {
    pub site: SiteData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteData {
    pub cart: Option<WireCart>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireCart {
    pub entity_id: String,
    pub currency_code: String,
    pub line_items: WireLineItems,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireLineItems {
    #[serde(default)]
    pub physical_items: Vec<WireLineItem>,
    #[serde(default)]
    pub digital_items: Vec<WireLineItem>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireLineItem {
    pub entity_id: String,
    pub product_entity_id: u64,
    #[serde(default)]
    pub variant_entity_id: Option<u64>,
    pub name: String,
    pub quantity: u32,
    pub extended_sale_price: WireMoney,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMoney {
    pub value: f64,
    #[serde(default)]
    pub currency_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteLineItemData {
    pub cart: DeleteLineItemCart,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteLineItemCart {
    pub delete_cart_line_item: Option<DeleteLineItemPayload>,
}

/// The cart left behind by a deletion; `None` once the last item went.
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteLineItemPayload {
    pub cart: Option<WireCart>,
}
