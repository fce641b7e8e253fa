//! The Management API promotion catalog against a local stub server.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use turbo_commerce::bigcommerce::{BigCommercePromotionCatalog, ManagementClient, MAX_PROMOTION_PAGES};
use turbo_commerce::promotion::PromotionCatalog;
use turbo_commerce::{ProductId, PromotionId};
use turbo_data::FetchClient;

const PROMOTIONS: &str = "/v3/promotions";

// ---------------------------------------------------------------------------
// Stub server
// ---------------------------------------------------------------------------

/// Answers every request from a route function and records request targets.
struct StubServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StubServer {
    async fn start<F>(route: F) -> Self
    where
        F: Fn(&str) -> (u16, String) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let route = Arc::new(route);

        let log = requests.clone();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let route = route.clone();
                let log = log.clone();
                tokio::spawn(async move {
                    let mut head = Vec::new();
                    let mut chunk = [0u8; 1024];
                    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut chunk).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => head.extend_from_slice(&chunk[..n]),
                        }
                    }
                    let target = String::from_utf8_lossy(&head)
                        .split_whitespace()
                        .nth(1)
                        .unwrap_or("/")
                        .to_string();
                    log.lock().unwrap().push(target.clone());

                    let (status, body) = route(&target);
                    let response = format!(
                        "HTTP/1.1 {status} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        Self { addr, requests }
    }

    fn catalog(&self) -> BigCommercePromotionCatalog {
        let http = FetchClient::new().with_base_url(format!("http://{}", self.addr));
        BigCommercePromotionCatalog::new(ManagementClient::from_fetch_client(http))
    }

    /// Requests made to a path, ignoring the query string.
    fn hits(&self, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|target| path_of(target) == path)
            .count()
    }
}

fn path_of(target: &str) -> &str {
    target.split('?').next().unwrap_or(target)
}

fn page_of(target: &str) -> u32 {
    target
        .split_once('?')
        .into_iter()
        .flat_map(|(_, query)| query.split('&'))
        .find_map(|pair| pair.strip_prefix("page="))
        .and_then(|page| page.parse().ok())
        .unwrap_or(1)
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

fn record(id: u64, redemption: &str, display_name: &str, product: u64, gift: u64) -> Value {
    json!({
        "id": id,
        "name": format!("Promo {id}"),
        "status": "ENABLED",
        "redemption_type": redemption,
        "display_name": display_name,
        "rules": [{
            "action": {"gift_item": {"product_id": gift, "quantity": 1}},
            "apply_once": true,
            "condition": {"cart": {"items": {"products": [product]}, "minimum_quantity": 1}}
        }]
    })
}

fn page(records: Vec<Value>, current: u32, total: u32) -> (u16, String) {
    let body = json!({
        "data": records,
        "meta": {"pagination": {"current_page": current, "total_pages": total}}
    });
    (200, body.to_string())
}

fn codes(codes: &[&str]) -> (u16, String) {
    let data: Vec<Value> = codes
        .iter()
        .enumerate()
        .map(|(i, code)| json!({"id": i + 1, "code": code, "current_uses": 0, "max_uses": 100}))
        .collect();
    (200, json!({ "data": data }).to_string())
}

fn server_error() -> (u16, String) {
    (500, r#"{"status":500,"title":"Internal Server Error"}"#.to_string())
}

fn not_found() -> (u16, String) {
    (404, r#"{"status":404,"title":"Not Found"}"#.to_string())
}

// ---------------------------------------------------------------------------
// Listing failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_listing_error_is_unavailable() {
    let server = StubServer::start(|_| server_error()).await;

    let result = server.catalog().promotions_for_product(ProductId::new(111)).await;

    assert!(result.is_none());
    // First attempt plus two replays.
    assert_eq!(server.hits(PROMOTIONS), 3);
}

#[tokio::test]
async fn test_invalid_listing_payload_is_unavailable() {
    let server = StubServer::start(|target| match path_of(target) {
        PROMOTIONS => (
            200,
            r#"{"data": [{"id": 1, "name": "x", "status": "PAUSED", "rules": []}]}"#.to_string(),
        ),
        _ => not_found(),
    })
    .await;

    let result = server.catalog().promotions_for_product(ProductId::new(111)).await;

    assert!(result.is_none());
    assert_eq!(server.hits(PROMOTIONS), 1);
}

#[tokio::test]
async fn test_no_matching_promotion_is_empty_not_unavailable() {
    let server = StubServer::start(|target| match path_of(target) {
        PROMOTIONS => page(vec![record(1, "AUTOMATIC", "Free mug", 999, 200)], 1, 1),
        _ => not_found(),
    })
    .await;

    let result = server.catalog().promotions_for_product(ProductId::new(111)).await;

    assert_eq!(result, Some(Vec::new()));
}

// ---------------------------------------------------------------------------
// Coupon codes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_coupon_promotion_uses_first_code() {
    let server = StubServer::start(|target| match path_of(target) {
        PROMOTIONS => page(
            vec![
                record(7, "COUPON", "Free mug", 111, 200),
                record(8, "AUTOMATIC", "Free tote", 111, 300),
            ],
            1,
            1,
        ),
        "/v3/promotions/7/codes" => codes(&["MUG10", "MUG20"]),
        _ => not_found(),
    })
    .await;

    let promotions = server
        .catalog()
        .promotions_for_product(ProductId::new(111))
        .await
        .unwrap();

    assert_eq!(promotions.len(), 2);
    assert_eq!(promotions[0].id, PromotionId::new(7));
    assert_eq!(promotions[0].promo_code.as_deref(), Some("MUG10"));
    assert_eq!(promotions[0].display_name.as_deref(), Some("Free mug"));
    // Automatic promotions never look up codes.
    assert_eq!(promotions[1].promo_code.as_deref(), Some("Free tote"));
    assert_eq!(server.hits("/v3/promotions/8/codes"), 0);
}

#[tokio::test]
async fn test_coupon_lookup_failure_keeps_display_name() {
    let server = StubServer::start(|target| match path_of(target) {
        PROMOTIONS => page(vec![record(7, "COUPON", "Free mug", 111, 200)], 1, 1),
        "/v3/promotions/7/codes" => server_error(),
        _ => not_found(),
    })
    .await;

    let promotions = server
        .catalog()
        .promotions_for_product(ProductId::new(111))
        .await
        .unwrap();

    assert_eq!(promotions.len(), 1);
    assert_eq!(promotions[0].promo_code.as_deref(), Some("Free mug"));
    // One replay for the codes endpoint.
    assert_eq!(server.hits("/v3/promotions/7/codes"), 2);
}

#[tokio::test]
async fn test_coupon_without_codes_keeps_display_name() {
    let server = StubServer::start(|target| match path_of(target) {
        PROMOTIONS => page(vec![record(7, "COUPON", "Free mug", 111, 200)], 1, 1),
        "/v3/promotions/7/codes" => codes(&[]),
        _ => not_found(),
    })
    .await;

    let promotions = server
        .catalog()
        .promotions_for_product(ProductId::new(111))
        .await
        .unwrap();

    assert_eq!(promotions[0].promo_code.as_deref(), Some("Free mug"));
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_listing_follows_pages() {
    let server = StubServer::start(|target| match (path_of(target), page_of(target)) {
        (PROMOTIONS, 1) => page(vec![record(1, "AUTOMATIC", "Free mug", 111, 200)], 1, 2),
        (PROMOTIONS, 2) => page(vec![record(2, "AUTOMATIC", "Free tote", 111, 300)], 2, 2),
        _ => not_found(),
    })
    .await;

    let promotions = server
        .catalog()
        .promotions_for_product(ProductId::new(111))
        .await
        .unwrap();

    let ids: Vec<PromotionId> = promotions.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![PromotionId::new(1), PromotionId::new(2)]);
    assert_eq!(server.hits(PROMOTIONS), 2);
}

#[tokio::test]
async fn test_listing_stops_at_page_cap() {
    let server = StubServer::start(|target| match path_of(target) {
        PROMOTIONS => {
            let current = page_of(target);
            page(
                vec![record(u64::from(current), "AUTOMATIC", "Free mug", 111, 200)],
                current,
                500,
            )
        }
        _ => not_found(),
    })
    .await;

    let promotions = server
        .catalog()
        .promotions_for_product(ProductId::new(111))
        .await
        .unwrap();

    assert_eq!(promotions.len(), MAX_PROMOTION_PAGES as usize);
    assert_eq!(server.hits(PROMOTIONS), MAX_PROMOTION_PAGES as usize);
}
