//! HTTP API round trips through the full router and middleware stack

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use reelvault::{
    api::{
        create_app,
        errors::ErrorResponse,
        models::{AmountRequest, BalanceResponse, FulfillRequest, HealthResponse, SpinRequest, SpinResponse},
        AppState,
    },
    config::ApiConfig,
    spins::LocalRandomnessOracle,
    ManualClock, PayoutClassifier, PayoutTier, SlotConfig, SlotMachine, SpinResult, SpinStatus,
    StaticPriceFeed, CREDIT_UNIT,
};
use serde::{de::DeserializeOwned, Serialize};
use std::{sync::Arc, time::Duration};
use tower::ServiceExt;

const NOW: u64 = 1_700_000_000;

fn app() -> Router {
    let feed = Arc::new(StaticPriceFeed::with_prices(2_500, 15, NOW));
    let machine = SlotMachine::builder(SlotConfig::testing(), feed.clone(), Arc::new(LocalRandomnessOracle::new()))
        .clock(Arc::new(ManualClock::new(NOW)))
        .classifier(PayoutClassifier::shared().unwrap().clone())
        .build()
        .unwrap();

    let state = Arc::new(AppState {
        machine: Arc::new(machine),
        price_feed: Some(feed),
        version: "test".to_string(),
        result_wait: Duration::from_millis(50),
        vrf_public_key: None,
    });
    create_app(state, &ApiConfig::default())
}

async fn call<T: DeserializeOwned>(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<impl Serialize>,
) -> (StatusCode, Option<String>, T) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let request_id = response
        .headers()
        .get("x-request-id")
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed = serde_json::from_slice(&bytes)
        .unwrap_or_else(|e| panic!("{} {}: {} in {}", method, uri, e, String::from_utf8_lossy(&bytes)));
    (status, request_id, parsed)
}

#[tokio::test]
async fn test_health_reports_version_and_request_id() {
    let app = app();
    let (status, request_id, health): (_, _, HealthResponse) = call(&app, "GET", "/health", None::<()>).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(health.version, "test");
    assert_eq!(health.pending_requests, 0);
    assert!(request_id.is_some());
}

#[tokio::test]
async fn test_spin_fulfill_and_read_back() {
    let app = app();

    let (status, _, balance): (_, _, BalanceResponse) = call(
        &app,
        "POST",
        "/players/alice/deposit",
        Some(AmountRequest { amount: 100 * CREDIT_UNIT }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(balance.balance, 100 * CREDIT_UNIT);

    let (status, _, _): (_, _, serde_json::Value) =
        call(&app, "POST", "/house/fund", Some(AmountRequest { amount: 1_000 })).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, spin): (_, _, SpinResponse) = call(
        &app,
        "POST",
        "/spins",
        Some(SpinRequest {
            player: "alice".to_string(),
            reel_count: 3,
            bet_amount: 10 * CREDIT_UNIT,
            wait: Some(false),
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(spin.result.status, SpinStatus::Pending);

    // 131090 reads 3, 3, 3
    let (status, _, settled): (_, _, SpinResult) = call(
        &app,
        "POST",
        "/oracle/fulfill",
        Some(FulfillRequest {
            request_id: spin.request_id,
            random_word: format!("0x{:x}", 131_090u128),
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settled.payout_tier, Some(PayoutTier::BigWin));

    let uri = format!("/spins/{}", spin.request_id);
    let (status, _, read): (_, _, SpinResult) = call(&app, "GET", &uri, None::<()>).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(read, settled);

    let (status, _, error): (_, _, ErrorResponse) = call(
        &app,
        "POST",
        "/oracle/fulfill",
        Some(FulfillRequest {
            request_id: spin.request_id,
            random_word: "0x1".to_string(),
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error.error.code, "ALREADY_FULFILLED");
}

#[tokio::test]
async fn test_errors_carry_kind_and_request_id() {
    let app = app();

    let (status, request_id, error): (_, _, ErrorResponse) = call(&app, "GET", "/spins/99", None::<()>).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error.error.code, "UNKNOWN_REQUEST");
    assert_eq!(request_id.as_deref(), Some(error.request_id.as_str()));

    let (status, _, error): (_, _, ErrorResponse) = call(
        &app,
        "POST",
        "/spins",
        Some(SpinRequest {
            player: "bob".to_string(),
            reel_count: 9,
            bet_amount: CREDIT_UNIT,
            wait: Some(false),
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error.error.code, "INVALID_REEL_COUNT");

    let (status, _, error): (_, _, ErrorResponse) = call(
        &app,
        "POST",
        "/oracle/fulfill",
        Some(FulfillRequest {
            request_id: 1,
            random_word: "0xzz".to_string(),
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error.error.code, "INVALID_RANDOM_WORD");
}
