use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use aqi_config::UpstreamConfig;
use aqi_core::{AirQualitySource, LocationQuery, UpstreamReply};
use aqi_upstream::DataGovSource;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tokio::net::TcpListener;
use url::Url;

const DATASET_PATH: &str = "/resource/test-dataset";

async fn spawn_upstream(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

fn source_for(addr: SocketAddr, timeout: Duration) -> DataGovSource {
    source_with_key(addr, timeout, "test-key")
}

fn source_with_key(addr: SocketAddr, timeout: Duration, api_key: &str) -> DataGovSource {
    let config = UpstreamConfig {
        dataset_url: Url::parse(&format!("http://{addr}{DATASET_PATH}")).unwrap(),
        api_key: api_key.to_string(),
        timeout,
        limit: 10,
    };
    DataGovSource::new(config).unwrap()
}

fn delhi() -> LocationQuery {
    LocationQuery::ByCity {
        city: "  New Delhi ".into(),
        state: "Delhi".into(),
    }
}

#[tokio::test]
async fn payload_is_decoded_and_filters_are_sent() {
    type Seen = Arc<Mutex<Option<HashMap<String, String>>>>;
    let seen: Seen = Arc::default();

    async fn handler(
        State(seen): State<Seen>,
        Query(params): Query<HashMap<String, String>>,
    ) -> Json<serde_json::Value> {
        *seen.lock().unwrap() = Some(params);
        Json(serde_json::json!({
            "total": "2",
            "records": [
                {"city": "Delhi", "state": "Delhi", "avg_value": "NA", "last_update": "2024-01-01 09:00:00"},
                {"city": "Delhi", "state": "Delhi", "avg_value": "45", "last_update": "2024-01-01 10:00:00"}
            ]
        }))
    }

    let router = Router::new()
        .route(DATASET_PATH, get(handler))
        .with_state(Arc::clone(&seen));
    let addr = spawn_upstream(router).await;
    let source = source_for(addr, Duration::from_secs(5));

    let reply = source.fetch(&delhi()).await;
    let UpstreamReply::Payload(payload) = reply else {
        panic!("expected payload, got {reply:?}");
    };
    assert_eq!(payload.records.len(), 2);

    let params = seen.lock().unwrap().clone().unwrap();
    assert_eq!(params["api-key"], "test-key");
    assert_eq!(params["format"], "json");
    assert_eq!(params["limit"], "10");
    assert_eq!(params["filters[city]"], "New Delhi");
    assert_eq!(params["filters[state]"], "Delhi");
    assert_eq!(params["filters[pollutant_id]"], "PM2.5");
}

#[tokio::test]
async fn coordinates_are_sent_as_filters() {
    type Seen = Arc<Mutex<Option<HashMap<String, String>>>>;
    let seen: Seen = Arc::default();

    async fn handler(
        State(seen): State<Seen>,
        Query(params): Query<HashMap<String, String>>,
    ) -> Json<serde_json::Value> {
        *seen.lock().unwrap() = Some(params);
        Json(serde_json::json!({ "records": [] }))
    }

    let router = Router::new()
        .route(DATASET_PATH, get(handler))
        .with_state(Arc::clone(&seen));
    let addr = spawn_upstream(router).await;
    let source = source_for(addr, Duration::from_secs(5));

    let reply = source
        .fetch(&LocationQuery::ByCoords {
            lat: 28.0,
            lon: 77.2167,
        })
        .await;
    assert!(matches!(reply, UpstreamReply::Payload(ref p) if p.records.is_empty()));

    let params = seen.lock().unwrap().clone().unwrap();
    assert_eq!(params["filters[latitude]"], "28.0");
    assert_eq!(params["filters[longitude]"], "77.2167");
    assert!(!params.contains_key("filters[city]"));
}

#[tokio::test]
async fn error_status_is_passed_through_with_body() {
    let router = Router::new().route(
        DATASET_PATH,
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded") }),
    );
    let addr = spawn_upstream(router).await;
    let source = source_for(addr, Duration::from_secs(5));

    let reply = source.fetch(&delhi()).await;
    assert_eq!(
        reply,
        UpstreamReply::HttpStatus {
            status: 500,
            body: "upstream exploded".to_string(),
        }
    );
}

#[tokio::test]
async fn forbidden_status_is_passed_through() {
    let router = Router::new().route(
        DATASET_PATH,
        get(|| async { (StatusCode::FORBIDDEN, "invalid api key") }),
    );
    let addr = spawn_upstream(router).await;
    let source = source_for(addr, Duration::from_secs(5));

    let reply = source.fetch(&delhi()).await;
    assert!(matches!(reply, UpstreamReply::HttpStatus { status: 403, .. }));
}

#[tokio::test]
async fn connection_refused_is_unreachable() {
    // Grab a free port, then close it so nothing is listening
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let source = source_for(addr, Duration::from_secs(5));
    let reply = source.fetch(&delhi()).await;
    assert!(matches!(reply, UpstreamReply::Unreachable { .. }));
}

#[tokio::test]
async fn slow_upstream_times_out_as_unreachable() {
    let router = Router::new().route(
        DATASET_PATH,
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(serde_json::json!({ "records": [] }))
        }),
    );
    let addr = spawn_upstream(router).await;
    let source = source_for(addr, Duration::from_millis(200));

    let reply = source.fetch(&delhi()).await;
    assert!(matches!(reply, UpstreamReply::Unreachable { .. }));
}

#[tokio::test]
async fn non_json_body_is_unreachable() {
    let router = Router::new().route(DATASET_PATH, get(|| async { "<html>maintenance</html>" }));
    let addr = spawn_upstream(router).await;
    let source = source_for(addr, Duration::from_secs(5));

    let reply = source.fetch(&delhi()).await;
    let UpstreamReply::Unreachable { detail } = reply else {
        panic!("expected unreachable, got {reply:?}");
    };
    assert!(detail.starts_with("invalid payload"));
}

#[tokio::test]
async fn unreachable_detail_does_not_carry_api_key() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let source = source_with_key(addr, Duration::from_secs(5), "SUPERSECRETKEY");
    let reply = source.fetch(&delhi()).await;
    let UpstreamReply::Unreachable { detail } = reply else {
        panic!("expected unreachable, got {reply:?}");
    };
    assert!(!detail.contains("SUPERSECRETKEY"), "{detail}");
    assert!(!detail.contains("api-key"), "{detail}");
}

#[tokio::test]
async fn timeout_detail_does_not_carry_api_key() {
    let router = Router::new().route(
        DATASET_PATH,
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(serde_json::json!({ "records": [] }))
        }),
    );
    let addr = spawn_upstream(router).await;
    let source = source_with_key(addr, Duration::from_millis(200), "SUPERSECRETKEY");

    let reply = source.fetch(&delhi()).await;
    let UpstreamReply::Unreachable { detail } = reply else {
        panic!("expected unreachable, got {reply:?}");
    };
    assert!(!detail.contains("SUPERSECRETKEY"), "{detail}");
}

#[tokio::test]
async fn null_records_decode_as_empty_payload() {
    let router = Router::new().route(
        DATASET_PATH,
        get(|| async { Json(serde_json::json!({ "records": null, "total": 0 })) }),
    );
    let addr = spawn_upstream(router).await;
    let source = source_for(addr, Duration::from_secs(5));

    let reply = source.fetch(&delhi()).await;
    assert!(matches!(reply, UpstreamReply::Payload(ref p) if p.records.is_empty()));
    assert_eq!(
        aqi_core::resolve(reply),
        Err(aqi_core::AqiError::NotFound(aqi_core::NotFoundReason::NoRecords))
    );
}

#[tokio::test]
async fn odd_total_field_does_not_discard_records() {
    let router = Router::new().route(
        DATASET_PATH,
        get(|| async {
            Json(serde_json::json!({
                "total": "5",
                "records": [
                    {"city": "Delhi", "state": "Delhi", "avg_value": "45", "last_update": "2024-01-01 10:00:00"}
                ]
            }))
        }),
    );
    let addr = spawn_upstream(router).await;
    let source = source_for(addr, Duration::from_secs(5));

    let result = aqi_core::resolve(source.fetch(&delhi()).await).unwrap();
    assert_eq!(result.aqi, 75);
    assert_eq!(result.raw_pm25, 45.0);
}
