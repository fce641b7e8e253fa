//! Storefront GraphQL client implementing the cart ports.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::debug;
use turbo_data::{DependencyTag, FetchClient, FetchError, IssuedToken, TokenCache, TokenSource};

use crate::bigcommerce::management::ManagementClient;
use crate::bigcommerce::wire::{
    CartQueryData, DeleteLineItemData, GraphQlRequest, GraphQlResponse, WireCart, WireLineItem,
};
use crate::bigcommerce::BigCommerceConfig;
use crate::cart::{CartSnapshot, LineItem};
use crate::error::CommerceError;
use crate::ids::{CartId, LineItemId, ProductId, VariantId};
use crate::money::{Currency, Money};
use crate::reconcile::{CartReader, LineItemRemover, RemovalOutcome, RemoveLineItem};

macro_rules! cart_fragments {
    () => {
        r#"
fragment CartFields on Cart {
  entityId
  currencyCode
  lineItems {
    physicalItems { ...LineItemFields }
    digitalItems { ...LineItemFields }
  }
}

fragment LineItemFields on CartLineItem {
  entityId
  productEntityId
  variantEntityId
  name
  quantity
  extendedSalePrice { value currencyCode }
}
"#
    };
}

const GET_CART_QUERY: &str = concat!(
    r#"
query GetCart($cartId: String!) {
  site {
    cart(entityId: $cartId) { ...CartFields }
  }
}
"#,
    cart_fragments!()
);

const DELETE_LINE_ITEM_MUTATION: &str = concat!(
    r#"
mutation DeleteCartLineItem($input: DeleteCartLineItemInput!) {
  cart {
    deleteCartLineItem(input: $input) {
      cart { ...CartFields }
    }
  }
}
"#,
    cart_fragments!()
);

/// Mints storefront tokens through the Management API.
pub struct StorefrontTokenSource {
    management: ManagementClient,
    channel_id: u64,
    ttl: Duration,
}

impl StorefrontTokenSource {
    /// Create a source minting tokens for the configured channel.
    pub fn new(management: ManagementClient, config: &BigCommerceConfig) -> Self {
        Self {
            management,
            channel_id: config.channel_id,
            ttl: Duration::seconds(config.storefront_token_ttl_secs),
        }
    }
}

#[async_trait]
impl TokenSource for StorefrontTokenSource {
    async fn issue(&self) -> Result<IssuedToken, FetchError> {
        self.management
            .create_storefront_token(self.channel_id, Utc::now() + self.ttl)
            .await
    }
}

/// GraphQL client for the Storefront API.
#[derive(Clone)]
pub struct StorefrontClient {
    http: FetchClient,
    endpoint: String,
    tokens: Arc<TokenCache<StorefrontTokenSource>>,
}

impl StorefrontClient {
    /// Create a client for the configured store.
    pub fn new(config: &BigCommerceConfig, management: ManagementClient) -> Self {
        let tokens = TokenCache::new(StorefrontTokenSource::new(management, config));
        Self::with_token_cache(FetchClient::new(), config.storefront_graphql_url(), Arc::new(tokens))
    }

    /// Create a client over an existing fetch client and token cache.
    pub fn with_token_cache(
        http: FetchClient,
        endpoint: impl Into<String>,
        tokens: Arc<TokenCache<StorefrontTokenSource>>,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            tokens,
        }
    }

    /// Run a GraphQL operation and unwrap its data.
    async fn execute<V, T>(
        &self,
        query: &str,
        variables: V,
        tag: DependencyTag,
    ) -> Result<Option<T>, CommerceError>
    where
        V: Serialize + Send,
        T: DeserializeOwned + Send,
    {
        let token = self.tokens.acquire().await?;
        let request = GraphQlRequest { query, variables };

        let response = self
            .http
            .post(self.endpoint.as_str())
            .bearer_auth(&token)
            .json(&request)?
            .tagged(tag)
            .send()
            .await?;

        if response.status == 401 {
            // Token revoked before its expiry; mint a new one next time.
            self.tokens.invalidate().await;
        }

        let body: GraphQlResponse<T> = response.error_for_status()?.json()?;
        if !body.errors.is_empty() {
            let messages: Vec<String> = body.errors.into_iter().map(|e| e.message).collect();
            return Err(CommerceError::Platform(messages.join("; ")));
        }
        Ok(body.data)
    }
}

#[async_trait]
impl CartReader for StorefrontClient {
    async fn get_cart(&self, cart_id: &CartId) -> Result<Option<CartSnapshot>, CommerceError> {
        let data: Option<CartQueryData> = self
            .execute(
                GET_CART_QUERY,
                json!({ "cartId": cart_id.as_str() }),
                DependencyTag::Cart,
            )
            .await?;

        match data.and_then(|data| data.site.cart) {
            Some(cart) => cart_from_wire(cart).map(Some),
            None => {
                debug!(cart_id = %cart_id, "cart not found");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl LineItemRemover for StorefrontClient {
    async fn remove_line_item(
        &self,
        request: RemoveLineItem,
    ) -> Result<RemovalOutcome, CommerceError> {
        let variables = json!({
            "input": {
                "cartEntityId": request.cart_id.as_str(),
                "lineItemEntityId": request.line_item_id.as_str(),
            }
        });

        let data: Option<DeleteLineItemData> = self
            .execute(
                DELETE_LINE_ITEM_MUTATION,
                variables,
                DependencyTag::CartMutation,
            )
            .await?;

        let remaining = data
            .and_then(|data| data.cart.delete_cart_line_item)
            .and_then(|payload| payload.cart);

        match remaining {
            Some(cart) => {
                let cart = cart_from_wire(cart)?;
                debug!(
                    cart_id = %cart.id,
                    line_item_id = %request.line_item_id,
                    remaining = cart.line_items.len(),
                    "line item deleted"
                );
                Ok(RemovalOutcome::CartUpdated(cart))
            }
            None => {
                // The platform deletes a cart when its last line item goes.
                debug!(cart_id = %request.cart_id, "cart deleted with its last line item");
                Ok(RemovalOutcome::CartDeleted)
            }
        }
    }
}

/// Convert a GraphQL cart into a snapshot.
pub(crate) fn cart_from_wire(cart: WireCart) -> Result<CartSnapshot, CommerceError> {
    let currency = Currency::parse(&cart.currency_code)?;

    let line_items = cart
        .line_items
        .physical_items
        .into_iter()
        .chain(cart.line_items.digital_items)
        .map(|item| line_item_from_wire(item, currency))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CartSnapshot {
        id: CartId::new(cart.entity_id),
        currency,
        line_items,
    })
}

fn line_item_from_wire(item: WireLineItem, currency: Currency) -> Result<LineItem, CommerceError> {
    Ok(LineItem {
        id: LineItemId::new(item.entity_id),
        product_id: ProductId::new(item.product_entity_id),
        variant_id: item.variant_entity_id.filter(|&v| v != 0).map(VariantId::new),
        name: item.name,
        quantity: item.quantity,
        extended_sale_price: Money::from_decimal(item.extended_sale_price.value, currency)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CART: &str = r#"{"data": {"site": {"cart": {
        "entityId": "c-1",
        "currencyCode": "USD",
        "lineItems": {
            "physicalItems": [
                {"entityId": "li-1", "productEntityId": 111, "variantEntityId": 9,
                 "name": "Drill", "quantity": 3, "extendedSalePrice": {"value": 299.97}},
                {"entityId": "li-2", "productEntityId": 200, "variantEntityId": 0,
                 "name": "Mug", "quantity": 1, "extendedSalePrice": {"value": 0}}
            ],
            "digitalItems": [
                {"entityId": "li-3", "productEntityId": 300, "variantEntityId": null,
                 "name": "Manual", "quantity": 1, "extendedSalePrice": {"value": 0.0}}
            ]
        }
    }}}}"#;

    fn parse_cart() -> CartSnapshot {
        let response: GraphQlResponse<CartQueryData> = serde_json::from_str(CART).unwrap();
        let wire = response.data.and_then(|d| d.site.cart).unwrap();
        cart_from_wire(wire).unwrap()
    }

    #[test]
    fn test_physical_and_digital_items_flattened() {
        let cart = parse_cart();
        assert_eq!(cart.id.as_str(), "c-1");
        assert_eq!(cart.line_items.len(), 3);
        assert_eq!(cart.line_items[2].id.as_str(), "li-3");
    }

    #[test]
    fn test_prices_classified() {
        let parts = parse_cart().partition().unwrap();
        assert_eq!(parts.qualifying.len(), 1);
        assert_eq!(parts.qualifying[0].extended_sale_price.minor_units, 29997);
        assert_eq!(parts.gift_candidates.len(), 2);
    }

    #[test]
    fn test_zero_variant_is_none() {
        let cart = parse_cart();
        assert_eq!(cart.line_items[0].variant_id, Some(VariantId::new(9)));
        assert_eq!(cart.line_items[1].variant_id, None);
        assert_eq!(cart.line_items[1].gift_key().to_string(), "200-none");
    }

    #[test]
    fn test_any_iso_currency_accepted() {
        let response: GraphQlResponse<CartQueryData> =
            serde_json::from_str(&CART.replace("USD", "NZD")).unwrap();
        let cart = cart_from_wire(response.data.and_then(|d| d.site.cart).unwrap()).unwrap();
        assert_eq!(cart.currency.code(), "NZD");

        let response: GraphQlResponse<CartQueryData> =
            serde_json::from_str(&CART.replace("USD", "??")).unwrap();
        let err = cart_from_wire(response.data.and_then(|d| d.site.cart).unwrap()).unwrap_err();
        assert!(matches!(err, CommerceError::MalformedCart(_)));
    }

    #[test]
    fn test_sub_cent_paid_line_still_qualifies() {
        let response: GraphQlResponse<CartQueryData> =
            serde_json::from_str(&CART.replace("299.97", "0.004")).unwrap();
        let cart = cart_from_wire(response.data.and_then(|d| d.site.cart).unwrap()).unwrap();
        let parts = cart.partition().unwrap();
        assert_eq!(parts.qualifying.len(), 1);
        assert_eq!(parts.qualifying[0].id.as_str(), "li-1");
        assert_eq!(parts.qualifying[0].extended_sale_price.minor_units, 1);
        assert_eq!(parts.gift_candidates.len(), 2);
    }

    #[test]
    fn test_three_decimal_cart_prices() {
        let response: GraphQlResponse<CartQueryData> =
            serde_json::from_str(&CART.replace("USD", "KWD").replace("299.97", "0.004")).unwrap();
        let cart = cart_from_wire(response.data.and_then(|d| d.site.cart).unwrap()).unwrap();
        assert_eq!(cart.line_items[0].extended_sale_price.minor_units, 4);
        assert_eq!(cart.line_items[0].extended_sale_price.to_string(), "0.004 KWD");
    }

    #[test]
    fn test_mutations_share_cart_selection() {
        for document in [GET_CART_QUERY, DELETE_LINE_ITEM_MUTATION] {
            assert!(document.contains("fragment CartFields on Cart"));
            assert!(document.contains("extendedSalePrice { value currencyCode }"));
        }
        assert!(DELETE_LINE_ITEM_MUTATION.contains("cart { ...CartFields }"));
    }
}
