//! Management API client and the promotion catalog built on it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{debug, info, warn};
use turbo_data::{DependencyTag, FetchClient, FetchError, IssuedToken};

use crate::bigcommerce::normalize::select_for_product;
use crate::bigcommerce::wire::{
    CouponCode, CouponCodesPage, PromotionRecord, PromotionsPage, StorefrontTokenRequest,
    StorefrontTokenResponse,
};
use crate::bigcommerce::BigCommerceConfig;
use crate::ids::{ProductId, PromotionId};
use crate::promotion::{Promotion, PromotionCatalog};

/// Upper bound on promotion pages read in one listing.
pub const MAX_PROMOTION_PAGES: u32 = 20;

const PAGE_LIMIT: u32 = 50;

/// REST client for the BigCommerce Management API v3.
#[derive(Clone)]
pub struct ManagementClient {
    http: FetchClient,
}

impl ManagementClient {
    /// Create a client for the configured store.
    pub fn new(config: &BigCommerceConfig) -> Self {
        let http = FetchClient::new()
            .with_base_url(config.management_base_url())
            .with_default_header("X-Auth-Token", config.access_token.clone())
            .with_default_header("Accept", "application/json");
        Self { http }
    }

    /// Use a preconfigured fetch client. Paths are resolved against its base URL.
    pub fn from_fetch_client(http: FetchClient) -> Self {
        Self { http }
    }

    /// List every promotion in the store, following pagination.
    pub async fn fetch_promotions(&self) -> Result<Vec<PromotionRecord>, FetchError> {
        let mut records = Vec::new();
        let mut page = 1;

        loop {
            let response: PromotionsPage = self
                .http
                .get("/v3/promotions")
                .query("page", page.to_string())
                .query("limit", PAGE_LIMIT.to_string())
                .tagged(DependencyTag::Promotions)
                .fetch_json()
                .await?;

            records.extend(response.data);

            let total_pages = response
                .meta
                .map(|meta| meta.pagination.total_pages)
                .unwrap_or(page);
            if page >= total_pages {
                break;
            }
            if page >= MAX_PROMOTION_PAGES {
                warn!(total_pages, "promotion listing truncated");
                break;
            }
            page += 1;
        }

        debug!(count = records.len(), "promotions fetched");
        Ok(records)
    }

    /// List the coupon codes of a promotion.
    pub async fn fetch_promotion_codes(
        &self,
        promotion_id: PromotionId,
    ) -> Result<Vec<CouponCode>, FetchError> {
        let response: CouponCodesPage = self
            .http
            .get(format!("/v3/promotions/{}/codes", promotion_id))
            .tagged(DependencyTag::PromotionCodes)
            .fetch_json()
            .await?;
        Ok(response.data)
    }

    /// Mint a storefront API token for a channel.
    pub async fn create_storefront_token(
        &self,
        channel_id: u64,
        expires_at: DateTime<Utc>,
    ) -> Result<IssuedToken, FetchError> {
        let body = StorefrontTokenRequest {
            channel_id,
            expires_at: expires_at.timestamp(),
            allowed_cors_origins: Vec::new(),
        };

        let response: StorefrontTokenResponse = self
            .http
            .post("/v3/storefront/api-token")
            .json(&body)?
            .tagged(DependencyTag::Credentials)
            .fetch_json()
            .await?;

        info!(channel_id, %expires_at, "storefront token issued");
        Ok(IssuedToken::new(response.data.token, expires_at))
    }
}

/// [`PromotionCatalog`] backed by the Management API.
///
/// Every lookup lists promotions fresh; nothing is cached between calls.
#[derive(Clone)]
pub struct BigCommercePromotionCatalog {
    client: ManagementClient,
}

impl BigCommercePromotionCatalog {
    /// Create a catalog over a management client.
    pub fn new(client: ManagementClient) -> Self {
        Self { client }
    }

    /// First coupon code of a promotion, if it can be read.
    async fn first_coupon_code(&self, promotion_id: PromotionId) -> Option<String> {
        match self.client.fetch_promotion_codes(promotion_id).await {
            Ok(codes) => codes.into_iter().next().map(|code| code.code),
            Err(e) => {
                warn!(%promotion_id, error = %e, "coupon code lookup failed");
                None
            }
        }
    }
}

#[async_trait]
impl PromotionCatalog for BigCommercePromotionCatalog {
    async fn promotions_for_product(&self, product_id: ProductId) -> Option<Vec<Promotion>> {
        let records = match self.client.fetch_promotions().await {
            Ok(records) => records,
            Err(e) => {
                warn!(%product_id, error = %e, "promotion listing failed");
                return None;
            }
        };

        let selected = select_for_product(&records, product_id);

        let promotions = join_all(selected.into_iter().map(|(record, mut promo)| async move {
            if record.is_coupon() {
                if let Some(code) = self.first_coupon_code(promo.id).await {
                    promo.promo_code = Some(code);
                }
            }
            promo
        }))
        .await;

        debug!(%product_id, count = promotions.len(), "gift promotions selected");
        Some(promotions)
    }
}
